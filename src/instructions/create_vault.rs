use crate::errors::ProtocolError;
use crate::instructions::helpers::create_program_account;
use crate::pda::vault_address;
use crate::state::Vault;
use pinocchio::{
    cpi::{Seed, Signer},
    error::ProgramError,
    AccountView, ProgramResult,
};
use pinocchio_log::log;
use pinocchio_system::ID as SYSTEM_PROGRAM_ID;

/// ========== 创建金库所需的账户 ==========
pub struct CreateVaultAccounts<'a> {
    /// 支付租金的账户（必须是签名者，可以是任一委托人）
    pub payer: &'a AccountView,
    /// 第一位委托人（提款收款方）
    pub principal_a: &'a AccountView,
    /// 第二位委托人
    pub principal_b: &'a AccountView,
    /// 待创建的金库 PDA
    pub vault: &'a AccountView,
    /// Solana 系统程序
    pub system_program: &'a AccountView,
}

impl<'a> TryFrom<&'a [AccountView]> for CreateVaultAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        let [payer, principal_a, principal_b, vault, system_program] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        if !payer.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }

        if system_program.address() != &SYSTEM_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }

        // 两位委托人必须是不同的身份
        if principal_a.address() == principal_b.address() {
            return Err(ProtocolError::IdenticalPrincipals.into());
        }

        Ok(Self {
            payer,
            principal_a,
            principal_b,
            vault,
            system_program,
        })
    }
}

/// ========== CreateVault 指令 ==========
///
/// 在 (principal_a, principal_b) 推导出的地址上创建金库，并存入刚好够免租的 lamports。
/// 地址上已有本程序账户时拒绝，只有 lamports 的系统账户会被接管。
pub struct CreateVault<'a> {
    pub accounts: CreateVaultAccounts<'a>,
}

impl<'a> TryFrom<&'a [AccountView]> for CreateVault<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        Ok(Self {
            accounts: CreateVaultAccounts::try_from(accounts)?,
        })
    }
}

impl<'a> CreateVault<'a> {
    pub const DISCRIMINATOR: &'a u8 = &0;

    pub fn process(&mut self) -> ProgramResult {
        let principal_a = self.accounts.principal_a.address();
        let principal_b = self.accounts.principal_b.address();

        // ============ 校验金库地址 ============
        let (expected, bump) = vault_address(principal_a, principal_b);
        if &expected != self.accounts.vault.address() {
            return Err(ProgramError::InvalidSeeds);
        }

        // ============ 创建金库账户 ============
        let bump = [bump];
        let vault_seeds = [
            Seed::from(principal_a.as_ref()),
            Seed::from(principal_b.as_ref()),
            Seed::from(&bump),
        ];

        let lamports = create_program_account(
            self.accounts.payer,
            self.accounts.vault,
            Vault::LEN,
            &[Signer::from(&vault_seeds)],
        )?;

        // ============ 写入委托人 ============
        let vault = unsafe { Vault::load_mut_unchecked(self.accounts.vault)? };
        vault.set_inner(*principal_a, *principal_b, bump);

        log!("vault created, rent reserve: {}", lamports);
        Ok(())
    }
}
