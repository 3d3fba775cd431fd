use crate::authority::{has_joint_authority, SignerSet};
use crate::errors::ProtocolError;
use crate::pda::vault_address_with_bump;
use crate::state::Vault;
use core::mem::size_of;
use pinocchio::{
    error::ProgramError,
    sysvars::{rent::Rent, Sysvar},
    AccountView, ProgramResult,
};
use pinocchio_log::log;

/// ========== 从金库提款所需的账户 ==========
pub struct WithdrawAccounts<'a> {
    /// 第一位委托人，提款的收款方
    pub principal_a: &'a AccountView,
    /// 第二位委托人
    pub principal_b: &'a AccountView,
    /// 金库账户
    pub vault: &'a AccountView,
}

impl<'a> TryFrom<&'a [AccountView]> for WithdrawAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        let [principal_a, principal_b, vault] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // ============ 联合签名检查 ============
        // 在任何余额变动之前完成
        let signers = SignerSet::from_accounts([principal_a, principal_b]);
        if !has_joint_authority(&signers, principal_a.address(), principal_b.address()) {
            log!("withdraw rejected: both principals must sign");
            return Err(ProtocolError::MissingJointSignature.into());
        }

        // ============ 委托人与金库记录一致 ============
        {
            let state = Vault::load(vault)?;
            if state.principal_a() != principal_a.address()
                || state.principal_b() != principal_b.address()
            {
                return Err(ProtocolError::PrincipalMismatch.into());
            }

            let [bump] = state.bump();
            if &vault_address_with_bump(state.principal_a(), state.principal_b(), bump)?
                != vault.address()
            {
                return Err(ProgramError::InvalidSeeds);
            }
        }

        if !vault.is_writable() || !principal_a.is_writable() {
            return Err(ProgramError::InvalidAccountData);
        }

        Ok(Self {
            principal_a,
            principal_b,
            vault,
        })
    }
}

/// ========== 提款指令数据 ==========
#[repr(C, packed)]
pub struct WithdrawInstructionData {
    /// 提取的 lamports
    pub amount: u64,
}

impl<'a> TryFrom<&'a [u8]> for WithdrawInstructionData {
    type Error = ProgramError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        if data.len() != size_of::<u64>() {
            return Err(ProgramError::InvalidInstructionData);
        }

        let instruction_data = unsafe { (data.as_ptr() as *const Self).read_unaligned() };

        if instruction_data.amount == 0 {
            return Err(ProtocolError::ZeroAmount.into());
        }

        Ok(instruction_data)
    }
}

/// 金库扣除免租储备后还能提出的数量
#[inline(always)]
pub fn withdrawable(balance: u64, rent_reserve: u64) -> u64 {
    balance.saturating_sub(rent_reserve)
}

/// 把 amount 从金库直接划给收款方，金库至少保留 rent_reserve。
/// 失败时两边余额都不变。
pub fn release_lamports(
    vault: &AccountView,
    recipient: &AccountView,
    amount: u64,
    rent_reserve: u64,
) -> ProgramResult {
    let vault_balance = vault.lamports();
    if amount > withdrawable(vault_balance, rent_reserve) {
        return Err(ProtocolError::VaultInsufficientFunds.into());
    }

    let recipient_balance = recipient
        .lamports()
        .checked_add(amount)
        .ok_or(ProtocolError::MathOverflow)?;

    vault.set_lamports(vault_balance - amount);
    recipient.set_lamports(recipient_balance);
    Ok(())
}

/// ========== Withdraw 指令 ==========
///
/// 两位委托人共同签名后，把 lamports 从金库转给 principal_a。
/// 金库由本程序拥有，直接调整双方的 lamports，不经过系统程序。
pub struct Withdraw<'a> {
    pub accounts: WithdrawAccounts<'a>,
    pub instruction_data: WithdrawInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for Withdraw<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = WithdrawAccounts::try_from(accounts)?;
        let instruction_data = WithdrawInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> Withdraw<'a> {
    pub const DISCRIMINATOR: &'a u8 = &2;

    pub fn process(&mut self) -> ProgramResult {
        let amount = self.instruction_data.amount;

        let rent_reserve = Rent::get()?
            .try_minimum_balance(Vault::LEN)
            .map_err(|_| ProgramError::ArithmeticOverflow)?;

        release_lamports(
            self.accounts.vault,
            self.accounts.principal_a,
            amount,
            rent_reserve,
        )?;

        log!("vault withdraw: {} lamports", amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pda::vault_address;
    use crate::test_utils::{vault_data, TestAccount};
    use pinocchio::Address;

    const P1: Address = Address::new_from_array([11u8; 32]);
    const P2: Address = Address::new_from_array([22u8; 32]);
    const OUTSIDER: Address = Address::new_from_array([33u8; 32]);
    const RENT_RESERVE: u64 = 1_000_000;

    /// 按 (P1, P2) 推导出的金库，余额 300_000_000
    fn funded_vault() -> TestAccount {
        let (address, bump) = vault_address(&P1, &P2);
        TestAccount::new(address, crate::ID, 300_000_000, &vault_data(P1, P2, bump))
    }

    #[test]
    fn withdrawable_keeps_rent_reserve() {
        assert_eq!(withdrawable(300_000_000, 1_000_000), 299_000_000);
        assert_eq!(withdrawable(1_000_000, 1_000_000), 0);
        assert_eq!(withdrawable(10, 1_000_000), 0);
    }

    #[test]
    fn parses_withdraw_amount() {
        let data = 100_000_000u64.to_le_bytes();
        let parsed = WithdrawInstructionData::try_from(&data[..]).unwrap();
        let amount = parsed.amount;
        assert_eq!(amount, 100_000_000);
    }

    #[test]
    fn rejects_zero_withdraw() {
        let data = 0u64.to_le_bytes();
        assert_eq!(
            WithdrawInstructionData::try_from(&data[..]).err(),
            Some(ProtocolError::ZeroAmount.into())
        );
    }

    #[test]
    fn single_signature_cannot_withdraw() {
        let mut p1 = TestAccount::wallet(P1, 5_000_000).signer();
        let mut p2 = TestAccount::wallet(P2, 5_000_000);
        let mut vault = funded_vault();
        let accounts = [p1.view(), p2.view(), vault.view()];

        assert_eq!(
            WithdrawAccounts::try_from(&accounts[..]).err(),
            Some(ProtocolError::MissingJointSignature.into())
        );
        assert_eq!(accounts[2].lamports(), 300_000_000);
        assert_eq!(accounts[0].lamports(), 5_000_000);

        // 只有 P2 签名同样被拒绝
        let mut p1 = TestAccount::wallet(P1, 5_000_000);
        let mut p2 = TestAccount::wallet(P2, 5_000_000).signer();
        let accounts = [p1.view(), p2.view(), vault.view()];
        assert_eq!(
            WithdrawAccounts::try_from(&accounts[..]).err(),
            Some(ProtocolError::MissingJointSignature.into())
        );
    }

    #[test]
    fn outsider_cannot_stand_in_for_a_principal() {
        let mut p1 = TestAccount::wallet(P1, 0).signer();
        let mut outsider = TestAccount::wallet(OUTSIDER, 0).signer();
        let mut vault = funded_vault();
        let accounts = [p1.view(), outsider.view(), vault.view()];

        assert_eq!(
            WithdrawAccounts::try_from(&accounts[..]).err(),
            Some(ProtocolError::PrincipalMismatch.into())
        );
    }

    #[test]
    fn vault_at_foreign_address_is_rejected() {
        let mut p1 = TestAccount::wallet(P1, 0).signer();
        let mut p2 = TestAccount::wallet(P2, 0).signer();
        let (_, bump) = vault_address(&P1, &P2);
        let mut vault =
            TestAccount::new(OUTSIDER, crate::ID, 300_000_000, &vault_data(P1, P2, bump));
        let accounts = [p1.view(), p2.view(), vault.view()];

        assert_eq!(
            WithdrawAccounts::try_from(&accounts[..]).err(),
            Some(ProgramError::InvalidSeeds)
        );
    }

    #[test]
    fn read_only_vault_is_rejected() {
        let mut p1 = TestAccount::wallet(P1, 0).signer();
        let mut p2 = TestAccount::wallet(P2, 0).signer();
        let mut vault = funded_vault().read_only();
        let accounts = [p1.view(), p2.view(), vault.view()];

        assert_eq!(
            WithdrawAccounts::try_from(&accounts[..]).err(),
            Some(ProgramError::InvalidAccountData)
        );
    }

    #[test]
    fn joint_withdraw_moves_exact_amount_to_principal_a() {
        let mut p1 = TestAccount::wallet(P1, 5_000_000).signer();
        let mut p2 = TestAccount::wallet(P2, 5_000_000).signer();
        let mut vault = funded_vault();
        let accounts = [p1.view(), p2.view(), vault.view()];

        let withdraw = WithdrawAccounts::try_from(&accounts[..]).unwrap();
        release_lamports(withdraw.vault, withdraw.principal_a, 100_000_000, RENT_RESERVE).unwrap();

        assert_eq!(accounts[2].lamports(), 200_000_000);
        assert_eq!(accounts[0].lamports(), 105_000_000);
        assert_eq!(accounts[1].lamports(), 5_000_000);
    }

    #[test]
    fn withdraw_cannot_touch_rent_reserve() {
        let mut p1 = TestAccount::wallet(P1, 0).signer();
        let mut vault = funded_vault();
        let accounts = [p1.view(), vault.view()];

        assert_eq!(
            release_lamports(&accounts[1], &accounts[0], 300_000_000, RENT_RESERVE).err(),
            Some(ProtocolError::VaultInsufficientFunds.into())
        );
        assert_eq!(accounts[1].lamports(), 300_000_000);
        assert_eq!(accounts[0].lamports(), 0);

        release_lamports(&accounts[1], &accounts[0], 299_000_000, RENT_RESERVE).unwrap();
        assert_eq!(accounts[1].lamports(), RENT_RESERVE);
        assert_eq!(accounts[0].lamports(), 299_000_000);
    }
}
