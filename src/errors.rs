use pinocchio::error::ProgramError;

/// ========== 程序自定义错误 ==========
///
/// 链上以 `ProgramError::Custom(code)` 的形式返回，code 即枚举的判别值。
/// 账户形状类错误（数量、所有者、长度）直接使用 `ProgramError` 自带的变体。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ProtocolError {
    // ---------- 授权 ----------
    /// 金库提款缺少两位委托人中任意一方的签名
    MissingJointSignature = 0,
    /// 签名者不是兑换状态账户记录的管理员
    NotAdministrator = 1,
    /// 传入的委托人与金库记录不一致
    PrincipalMismatch = 2,

    // ---------- 前置条件 ----------
    /// 价格为 0，尚未开放交易
    TradingDisabled = 3,
    /// 数量为 0
    ZeroAmount = 4,
    /// 扣除点差后输出为 0
    ZeroOutput = 5,
    /// 点差为 100% 时无法满足精确输出
    UnsatisfiableSpread = 6,
    /// 点差超出 [0, 10000]
    InvalidSpread = 7,
    /// X 与 Y 是同一种资产
    IdenticalMints = 8,
    /// 交易已过期
    Expired = 9,

    // ---------- 滑点 ----------
    /// 输出低于用户的最小期望
    OutputTooSmall = 10,
    /// 所需输入超过用户的最大允许
    InputTooLarge = 11,

    // ---------- 算术 ----------
    MathOverflow = 12,
    DivisionByZero = 13,

    // ---------- 余额 ----------
    /// 用户代币账户余额不足
    UserInsufficientBalance = 14,
    /// 金库可提余额（或托管账户余额）不足
    VaultInsufficientFunds = 15,

    /// 金库的两位委托人是同一个地址
    IdenticalPrincipals = 16,
}

impl From<ProtocolError> for ProgramError {
    fn from(e: ProtocolError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_codes_are_stable() {
        assert_eq!(
            ProgramError::from(ProtocolError::MissingJointSignature),
            ProgramError::Custom(0)
        );
        assert_eq!(
            ProgramError::from(ProtocolError::InputTooLarge),
            ProgramError::Custom(11)
        );
        assert_eq!(
            ProgramError::from(ProtocolError::VaultInsufficientFunds),
            ProgramError::Custom(15)
        );
    }
}
