//! 共管金库与定价兑换程序
//!
//! - 共管金库：两位委托人共同签名才能提取托管的 lamports
//! - 定价兑换：按管理员设定的参考价加固定点差，支持精确输入与精确输出

use pinocchio::{address::declare_id, error::ProgramError, AccountView, Address, ProgramResult};

/// 常量模块 - 缩放因子、种子与鉴别器
pub mod constants;
/// 错误模块 - 程序自定义错误码
pub mod errors;
/// 授权模块 - 签名者集合与授权判断
pub mod authority;
/// 地址推导模块
pub mod pda;
/// 定价引擎
pub mod pricing;
/// 指令模块
pub mod instructions;
/// 状态模块 - 金库与兑换状态账户布局
pub mod state;

#[cfg(test)]
mod test_utils;

pub use errors::*;
pub use instructions::*;
pub use state::*;

declare_id!("AWNJ6GvcS4MStSf978obcPDmD6M5hc6xJPqSyuruvTR9");

#[cfg(feature = "bpf-entrypoint")]
mod entrypoint {
    use pinocchio::entrypoint;

    entrypoint!(crate::process_instruction);
}

/// 主指令入口函数
///
/// 第一个字节是指令鉴别器，其余是该指令的数据。
pub fn process_instruction(
    _program_id: &Address,
    accounts: &[AccountView],
    instruction_data: &[u8],
) -> ProgramResult {
    match instruction_data.split_first() {
        Some((CreateVault::DISCRIMINATOR, _)) => CreateVault::try_from(accounts)?.process(),
        Some((Deposit::DISCRIMINATOR, data)) => Deposit::try_from((data, accounts))?.process(),
        Some((Withdraw::DISCRIMINATOR, data)) => Withdraw::try_from((data, accounts))?.process(),
        Some((Initialize::DISCRIMINATOR, data)) => {
            Initialize::try_from((data, accounts))?.process()
        }
        Some((UpdateParams::DISCRIMINATOR, data)) => {
            UpdateParams::try_from((data, accounts))?.process()
        }
        Some((UpdatePrice::DISCRIMINATOR, data)) => {
            UpdatePrice::try_from((data, accounts))?.process()
        }
        Some((SwapExactIn::DISCRIMINATOR, data)) => {
            SwapExactIn::try_from((data, accounts))?.process()
        }
        Some((SwapExactOut::DISCRIMINATOR, data)) => {
            SwapExactOut::try_from((data, accounts))?.process()
        }
        _ => Err(ProgramError::InvalidInstructionData),
    }
}
