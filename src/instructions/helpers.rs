use pinocchio::{
    cpi::Signer,
    error::ProgramError,
    sysvars::{rent::Rent, Sysvar},
    AccountView,
};
use pinocchio_system::instructions::{Allocate, Assign, CreateAccount, Transfer};
use pinocchio_system::ID as SYSTEM_PROGRAM_ID;

/// 已有 lamports 的地址只有仍归系统程序所有、且没有数据时才能接管
#[inline(always)]
pub fn check_prefunded(account: &AccountView) -> Result<(), ProgramError> {
    if !account.owned_by(&SYSTEM_PROGRAM_ID) || account.data_len() != 0 {
        return Err(ProgramError::AccountAlreadyInitialized);
    }
    Ok(())
}

/// ========== 在 PDA 上创建本程序账户 ==========
///
/// 地址为空时直接 CreateAccount。有人提前往地址里转了 lamports 时 CreateAccount 会失败，
/// 此时改为补足免租余额，再由 PDA 签名 Allocate + Assign。
/// 返回账户应持有的免租余额。
pub fn create_program_account(
    payer: &AccountView,
    account: &AccountView,
    space: usize,
    signers: &[Signer],
) -> Result<u64, ProgramError> {
    let current = account.lamports();
    if current != 0 {
        check_prefunded(account)?;
    }

    let rent_exempt = Rent::get()?
        .try_minimum_balance(space)
        .map_err(|_| ProgramError::ArithmeticOverflow)?;

    if current == 0 {
        CreateAccount {
            from: payer,
            to: account,
            lamports: rent_exempt,
            space: space as u64,
            owner: &crate::ID,
        }
        .invoke_signed(signers)?;
        return Ok(rent_exempt);
    }

    let shortfall = rent_exempt.saturating_sub(current);
    if shortfall > 0 {
        Transfer {
            from: payer,
            to: account,
            lamports: shortfall,
        }
        .invoke()?;
    }

    Allocate {
        account,
        space: space as u64,
    }
    .invoke_signed(signers)?;

    Assign {
        account,
        owner: &crate::ID,
    }
    .invoke_signed(signers)?;

    Ok(rent_exempt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestAccount;
    use pinocchio::Address;

    const TARGET: Address = Address::new_from_array([12u8; 32]);
    const PAYER: Address = Address::new_from_array([13u8; 32]);

    #[test]
    fn prefunded_system_account_can_be_taken_over() {
        let mut target = TestAccount::wallet(TARGET, 1);
        assert_eq!(check_prefunded(&target.view()), Ok(()));
    }

    #[test]
    fn existing_program_account_is_not_recreated() {
        let mut target = TestAccount::new(TARGET, crate::ID, 1_000_000, &[1u8; 66]);
        let mut payer = TestAccount::wallet(PAYER, 10_000_000).signer();
        let accounts = [payer.view(), target.view()];

        assert_eq!(
            create_program_account(&accounts[0], &accounts[1], 66, &[]),
            Err(ProgramError::AccountAlreadyInitialized)
        );
        assert_eq!(accounts[1].lamports(), 1_000_000);
        assert_eq!(accounts[0].lamports(), 10_000_000);
    }

    #[test]
    fn system_account_with_data_is_rejected() {
        let mut target = TestAccount::new(TARGET, SYSTEM_PROGRAM_ID, 1, &[0u8; 8]);
        assert_eq!(
            check_prefunded(&target.view()),
            Err(ProgramError::AccountAlreadyInitialized)
        );
    }
}
