use pinocchio::{AccountView, Address};

/// ========== 签名者集合 ==========
///
/// 当前指令中已由运行时验证过签名的地址集合。授权判断只看这个集合，
/// 不依赖任何隐式的“调用者身份”。
pub struct SignerSet<'a, const N: usize> {
    keys: [Option<&'a Address>; N],
}

impl<'a, const N: usize> SignerSet<'a, N> {
    #[inline(always)]
    pub const fn new(keys: [Option<&'a Address>; N]) -> Self {
        Self { keys }
    }

    /// 只收集 is_signer 为真的账户地址
    #[inline(always)]
    pub fn from_accounts(accounts: [&'a AccountView; N]) -> Self {
        Self {
            keys: accounts.map(|account| account.is_signer().then(|| account.address())),
        }
    }

    #[inline(always)]
    pub fn contains(&self, key: &Address) -> bool {
        self.keys.iter().flatten().any(|signer| *signer == key)
    }
}

/// 金库提款授权：两位委托人必须同时签名
#[inline(always)]
pub fn has_joint_authority<const N: usize>(
    signers: &SignerSet<'_, N>,
    principal_a: &Address,
    principal_b: &Address,
) -> bool {
    signers.contains(principal_a) && signers.contains(principal_b)
}

/// 参数更新授权：管理员必须签名
#[inline(always)]
pub fn is_administrator<const N: usize>(signers: &SignerSet<'_, N>, administrator: &Address) -> bool {
    signers.contains(administrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    const P1: Address = Address::new_from_array([1u8; 32]);
    const P2: Address = Address::new_from_array([2u8; 32]);
    const OTHER: Address = Address::new_from_array([3u8; 32]);

    #[test]
    fn both_principals_signed() {
        let signers = SignerSet::new([Some(&P1), Some(&P2)]);
        assert!(has_joint_authority(&signers, &P1, &P2));
    }

    #[test]
    fn single_signature_is_not_enough() {
        let only_a = SignerSet::new([Some(&P1), None]);
        assert!(!has_joint_authority(&only_a, &P1, &P2));

        let only_b = SignerSet::new([None, Some(&P2)]);
        assert!(!has_joint_authority(&only_b, &P1, &P2));

        let nobody = SignerSet::new([None, None]);
        assert!(!has_joint_authority(&nobody, &P1, &P2));
    }

    #[test]
    fn unrelated_signer_does_not_count() {
        let signers = SignerSet::new([Some(&P1), Some(&OTHER)]);
        assert!(!has_joint_authority(&signers, &P1, &P2));
    }

    #[test]
    fn signer_order_is_irrelevant() {
        let signers = SignerSet::new([Some(&P2), Some(&P1)]);
        assert!(has_joint_authority(&signers, &P1, &P2));
    }

    #[test]
    fn administrator_check() {
        assert!(is_administrator(&SignerSet::new([Some(&P1)]), &P1));
        assert!(!is_administrator(&SignerSet::new([Some(&OTHER)]), &P1));
        assert!(!is_administrator(&SignerSet::new([None]), &P1));
    }
}
