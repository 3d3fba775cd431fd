use crate::constants::EXCHANGE_SEED;
use pinocchio::{error::ProgramError, Address};
use pinocchio_token::ID as TOKEN_PROGRAM_ID;

/// ========== 确定性地址推导 ==========
///
/// 所有账户地址都由有序的种子推导而来，推导出的地址不在 ed25519 曲线上，
/// 不存在对应的私钥。交换种子顺序或改变域标签都会得到不同的地址。
///
/// 找不到合法 bump 时 `find_program_address` 会直接中止程序，视为不可恢复的配置错误。

/// 金库地址：种子为 [principal_a, principal_b]，没有域标签
#[inline(always)]
pub fn vault_address(principal_a: &Address, principal_b: &Address) -> (Address, u8) {
    Address::find_program_address(&[principal_a.as_ref(), principal_b.as_ref()], &crate::ID)
}

/// 用金库记录的 bump 重新计算金库地址，不再搜索 bump
#[inline(always)]
pub fn vault_address_with_bump(
    principal_a: &Address,
    principal_b: &Address,
    bump: u8,
) -> Result<Address, ProgramError> {
    Address::try_derive_address(
        &[principal_a.as_ref(), principal_b.as_ref()],
        Some(bump),
        &crate::ID,
    )
    .map_err(|_| ProgramError::InvalidSeeds)
}

/// 兑换状态地址：种子为 [b"state", mint_x, mint_y]
#[inline(always)]
pub fn exchange_address(mint_x: &Address, mint_y: &Address) -> (Address, u8) {
    Address::find_program_address(
        &[EXCHANGE_SEED, mint_x.as_ref(), mint_y.as_ref()],
        &crate::ID,
    )
}

/// 托管账户地址：兑换状态账户持有该 mint 的关联代币账户
#[inline(always)]
pub fn custody_address(exchange: &Address, mint: &Address) -> Address {
    let (address, _) = Address::find_program_address(
        &[exchange.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &pinocchio_associated_token_account::ID,
    );
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Address = Address::new_from_array([7u8; 32]);
    const B: Address = Address::new_from_array([9u8; 32]);

    #[test]
    fn vault_address_is_deterministic() {
        assert_eq!(vault_address(&A, &B), vault_address(&A, &B));
    }

    #[test]
    fn stored_bump_reproduces_vault_address() {
        let (vault, bump) = vault_address(&A, &B);
        assert_eq!(vault_address_with_bump(&A, &B, bump), Ok(vault));
        assert_ne!(vault_address_with_bump(&B, &A, bump), Ok(vault));
    }

    #[test]
    fn vault_address_depends_on_order() {
        assert_ne!(vault_address(&A, &B).0, vault_address(&B, &A).0);
    }

    #[test]
    fn domain_tag_separates_addresses() {
        assert_ne!(vault_address(&A, &B).0, exchange_address(&A, &B).0);
        assert_ne!(exchange_address(&A, &B).0, exchange_address(&B, &A).0);
    }

    #[test]
    fn derived_address_is_off_curve() {
        // create_program_address 只接受不在曲线上的结果
        let (vault, bump) = vault_address(&A, &B);
        let recreated =
            Address::create_program_address(&[A.as_ref(), B.as_ref(), &[bump]], &crate::ID)
                .unwrap();
        assert_eq!(vault, recreated);

        let (exchange, bump) = exchange_address(&A, &B);
        let recreated = Address::create_program_address(
            &[EXCHANGE_SEED, A.as_ref(), B.as_ref(), &[bump]],
            &crate::ID,
        )
        .unwrap();
        assert_eq!(exchange, recreated);
    }

    #[test]
    fn custody_accounts_differ_per_mint() {
        let (exchange, _) = exchange_address(&A, &B);
        assert_ne!(custody_address(&exchange, &A), custody_address(&exchange, &B));
    }
}
