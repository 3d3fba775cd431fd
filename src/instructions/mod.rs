/// ========== 全部指令模块 ==========
///
/// 共管金库：create_vault / deposit / withdraw
/// 定价兑换：initialize / update_params（含 update_price）/ swap

/// 创建共管金库
pub mod create_vault;
/// 向金库存入 lamports
pub mod deposit;
/// 在 PDA 上创建账户的公共流程
pub mod helpers;
/// 初始化兑换状态与托管账户
pub mod initialize;
/// 精确输入 / 精确输出交换
pub mod swap;
/// 管理员更新价格与点差
pub mod update_params;
/// 双签提款
pub mod withdraw;

pub use create_vault::*;
pub use deposit::*;
pub use initialize::*;
pub use swap::*;
pub use update_params::*;
pub use withdraw::*;
