use crate::constants::{EXCHANGE_SEED, MAX_SPREAD_BPS};
use crate::errors::ProtocolError;
use crate::instructions::helpers::create_program_account;
use crate::pda::{custody_address, exchange_address};
use crate::state::ExchangeState;
use core::mem::size_of;
use pinocchio::{
    cpi::{Seed, Signer},
    error::ProgramError,
    AccountView, ProgramResult,
};
use pinocchio_associated_token_account::instructions::Create as CreateAssociatedTokenAccount;
use pinocchio_log::log;
use pinocchio_system::ID as SYSTEM_PROGRAM_ID;
use pinocchio_token::ID as TOKEN_PROGRAM_ID;

/// ========== 初始化兑换所需的账户 ==========
///
/// 初始化者成为管理员，并为状态账户与两个托管代币账户支付租金。
pub struct InitializeAccounts<'a> {
    /// 初始化者（必须是签名者，成为管理员）
    pub initializer: &'a AccountView,
    /// 资产 X 的 mint
    pub mint_x: &'a AccountView,
    /// 资产 Y 的 mint
    pub mint_y: &'a AccountView,
    /// 兑换状态 PDA（种子 [b"state", mint_x, mint_y]）
    pub state: &'a AccountView,
    /// 资产 X 的托管账户（状态 PDA 的关联代币账户）
    pub custody_x: &'a AccountView,
    /// 资产 Y 的托管账户（状态 PDA 的关联代币账户）
    pub custody_y: &'a AccountView,
    /// Solana 系统程序
    pub system_program: &'a AccountView,
    /// SPL Token 程序
    pub token_program: &'a AccountView,
    /// 关联代币账户程序
    pub associated_token_program: &'a AccountView,
}

impl<'a> TryFrom<&'a [AccountView]> for InitializeAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        let [initializer, mint_x, mint_y, state, custody_x, custody_y, system_program, token_program, associated_token_program] =
            accounts
        else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        // ============ Initializer 验证 ============
        if !initializer.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }

        // ============ 程序账户验证 ============
        if system_program.address() != &SYSTEM_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }
        if token_program.address() != &TOKEN_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }
        if associated_token_program.address() != &pinocchio_associated_token_account::ID {
            return Err(ProgramError::IncorrectProgramId);
        }

        // ============ Mint 验证 ============
        // 两种资产必须不同，且都由 Token 程序拥有
        if mint_x.address() == mint_y.address() {
            return Err(ProtocolError::IdenticalMints.into());
        }
        if !mint_x.owned_by(&TOKEN_PROGRAM_ID) || !mint_y.owned_by(&TOKEN_PROGRAM_ID) {
            return Err(ProgramError::InvalidAccountOwner);
        }

        Ok(Self {
            initializer,
            mint_x,
            mint_y,
            state,
            custody_x,
            custody_y,
            system_program,
            token_program,
            associated_token_program,
        })
    }
}

/// ========== 初始化指令的数据 ==========
#[repr(C, packed)]
pub struct InitializeInstructionData {
    /// 点差（bps，范围 0-10000）
    pub spread_bps: u16,
}

impl TryFrom<&[u8]> for InitializeInstructionData {
    type Error = ProgramError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() != size_of::<u16>() {
            return Err(ProgramError::InvalidInstructionData);
        }

        let instruction_data = unsafe { (data.as_ptr() as *const Self).read_unaligned() };

        if instruction_data.spread_bps > MAX_SPREAD_BPS {
            return Err(ProtocolError::InvalidSpread.into());
        }

        Ok(instruction_data)
    }
}

/// ========== Initialize 指令 ==========
///
/// 为一个资产对创建兑换状态账户和两个托管账户，价格从 0 开始（交易关闭）。
pub struct Initialize<'a> {
    pub accounts: InitializeAccounts<'a>,
    pub instruction_data: InitializeInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for Initialize<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = InitializeAccounts::try_from(accounts)?;
        let instruction_data = InitializeInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> Initialize<'a> {
    pub const DISCRIMINATOR: &'a u8 = &3;

    /// 执行初始化流程
    ///
    /// 1. 校验状态 PDA 与托管账户地址
    /// 2. 创建并写入状态账户
    /// 3. 创建两个托管账户（owner 为状态 PDA）
    pub fn process(&mut self) -> ProgramResult {
        let mint_x = self.accounts.mint_x.address();
        let mint_y = self.accounts.mint_y.address();

        // ============ 第1步：校验地址 ============
        let (expected_state, bump) = exchange_address(mint_x, mint_y);
        if &expected_state != self.accounts.state.address() {
            return Err(ProgramError::InvalidSeeds);
        }
        if &custody_address(&expected_state, mint_x) != self.accounts.custody_x.address()
            || &custody_address(&expected_state, mint_y) != self.accounts.custody_y.address()
        {
            return Err(ProgramError::InvalidAccountData);
        }

        // ============ 第2步：创建状态账户 ============
        let bump = [bump];
        let state_seeds = [
            Seed::from(EXCHANGE_SEED),
            Seed::from(mint_x.as_ref()),
            Seed::from(mint_y.as_ref()),
            Seed::from(&bump),
        ];

        create_program_account(
            self.accounts.initializer,
            self.accounts.state,
            ExchangeState::LEN,
            &[Signer::from(&state_seeds)],
        )?;

        {
            let state = unsafe { ExchangeState::load_mut_unchecked(self.accounts.state)? };
            state.set_inner(
                *self.accounts.initializer.address(),
                *mint_x,
                *mint_y,
                self.instruction_data.spread_bps,
                bump,
            )?;
        }

        // ============ 第3步：创建托管账户 ============
        for (custody, mint) in [
            (self.accounts.custody_x, self.accounts.mint_x),
            (self.accounts.custody_y, self.accounts.mint_y),
        ] {
            CreateAssociatedTokenAccount {
                funding_account: self.accounts.initializer,
                account: custody,
                wallet: self.accounts.state,
                mint,
                system_program: self.accounts.system_program,
                token_program: self.accounts.token_program,
            }
            .invoke()?;
        }

        let spread_bps = self.instruction_data.spread_bps;
        log!("exchange initialized, spread: {} bps", spread_bps);
        Ok(())
    }
}
