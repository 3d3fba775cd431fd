/// ========== 程序常量 ==========
///
/// 链上程序没有运行时配置，所有参数都在编译期固定。

/// 价格的定点缩放因子：scaled_price = (每单位 X 可换的 Y) * PRICE_SCALE
pub const PRICE_SCALE: u128 = 1_000_000;

/// 基点换算（10_000 bps = 100%）
pub const BPS_SCALE: u128 = 10_000;

/// 点差上限（含）
pub const MAX_SPREAD_BPS: u16 = 10_000;

/// 兑换状态账户 PDA 的域分隔种子
pub const EXCHANGE_SEED: &[u8] = b"state";

/// 账户类型鉴别器（写在账户数据第一个字节）
pub const VAULT_DISCRIMINATOR: u8 = 1;
pub const EXCHANGE_DISCRIMINATOR: u8 = 2;
