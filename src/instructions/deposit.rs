use crate::errors::ProtocolError;
use crate::state::Vault;
use core::mem::size_of;
use pinocchio::{error::ProgramError, AccountView, Address, ProgramResult};
use pinocchio_log::log;
use pinocchio_system::instructions::Transfer;
use pinocchio_system::ID as SYSTEM_PROGRAM_ID;

/// ========== 向金库存款所需的账户 ==========
pub struct DepositAccounts<'a> {
    /// 存款人（必须是签名者，lamports 从这里扣除）
    pub depositor: &'a AccountView,
    /// 金库账户
    pub vault: &'a AccountView,
    /// Solana 系统程序
    pub system_program: &'a AccountView,
}

impl<'a> TryFrom<&'a [AccountView]> for DepositAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        let [depositor, vault, system_program] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // 只需要存款人自己的签名
        if !depositor.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }

        if system_program.address() != &SYSTEM_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }

        Ok(Self {
            depositor,
            vault,
            system_program,
        })
    }
}

/// ========== 存款指令数据 ==========
#[repr(C, packed)]
pub struct DepositInstructionData {
    /// 这笔存款记在哪位委托人名下（不要求其签名）
    pub on_behalf_of: [u8; 32],
    /// 存入的 lamports
    pub amount: u64,
}

impl<'a> TryFrom<&'a [u8]> for DepositInstructionData {
    type Error = ProgramError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        const DEPOSIT_DATA_LEN: usize = size_of::<[u8; 32]>() + size_of::<u64>();
        if data.len() != DEPOSIT_DATA_LEN {
            return Err(ProgramError::InvalidInstructionData);
        }

        let instruction_data = unsafe { (data.as_ptr() as *const Self).read_unaligned() };

        if instruction_data.amount == 0 {
            return Err(ProtocolError::ZeroAmount.into());
        }

        Ok(instruction_data)
    }
}

/// ========== Deposit 指令 ==========
///
/// 把 lamports 从存款人转入金库。余额不足时系统程序会拒绝转账。
pub struct Deposit<'a> {
    pub accounts: DepositAccounts<'a>,
    pub instruction_data: DepositInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for Deposit<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = DepositAccounts::try_from(accounts)?;
        let instruction_data = DepositInstructionData::try_from(data)?;

        // 受益人必须是金库的委托人之一
        {
            let vault = Vault::load(accounts.vault)?;
            let on_behalf_of = Address::new_from_array(instruction_data.on_behalf_of);
            if !vault.is_principal(&on_behalf_of) {
                return Err(ProtocolError::PrincipalMismatch.into());
            }
        }

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> Deposit<'a> {
    pub const DISCRIMINATOR: &'a u8 = &1;

    pub fn process(&mut self) -> ProgramResult {
        let amount = self.instruction_data.amount;

        Transfer {
            from: self.accounts.depositor,
            to: self.accounts.vault,
            lamports: amount,
        }
        .invoke()?;

        log!("vault deposit: {} lamports", amount);
        Ok(())
    }
}
