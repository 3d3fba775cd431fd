use crate::constants::EXCHANGE_SEED;
use crate::errors::ProtocolError;
use crate::pda::custody_address;
use crate::pricing::{quote_exact_in, quote_exact_out, Quote};
use crate::state::ExchangeState;
use core::mem::size_of;

use pinocchio::{
    cpi::{Seed, Signer},
    error::ProgramError,
    sysvars::{clock::Clock, Sysvar},
    AccountView, Address, ProgramResult,
};
use pinocchio_log::log;
use pinocchio_token::instructions::Transfer;
use pinocchio_token::state::TokenAccount;
use pinocchio_token::ID as TOKEN_PROGRAM_ID;

/// ========== 交换指令所需的账户 ==========
///
/// 精确输入与精确输出共用同一组账户。
pub struct SwapAccounts<'a> {
    /// 交易用户（必须是签名者）
    pub user: &'a AccountView,
    /// 用户的资产 X 代币账户
    pub user_x: &'a AccountView,
    /// 用户的资产 Y 代币账户
    pub user_y: &'a AccountView,
    /// 兑换状态账户（托管账户的 owner）
    pub state: &'a AccountView,
    /// 资产 X 的托管账户
    pub custody_x: &'a AccountView,
    /// 资产 Y 的托管账户
    pub custody_y: &'a AccountView,
    /// SPL Token 程序
    pub token_program: &'a AccountView,
}

/// 校验代币账户的格式、所属程序、mint 和持有人
#[inline(always)]
fn check_token_account(
    account: &AccountView,
    mint: &Address,
    holder: &Address,
) -> Result<(), ProgramError> {
    if account.data_len() != TokenAccount::LEN || !account.owned_by(&TOKEN_PROGRAM_ID) {
        return Err(ProgramError::InvalidAccountOwner);
    }
    let token_account = unsafe { TokenAccount::from_account_view_unchecked(account)? };
    if token_account.mint() != mint || token_account.owner() != holder {
        return Err(ProgramError::InvalidAccountData);
    }
    Ok(())
}

/// 读取代币账户余额，调用前必须已通过 check_token_account
#[inline(always)]
fn token_balance(account: &AccountView) -> Result<u64, ProgramError> {
    let token_account = unsafe { TokenAccount::from_account_view_unchecked(account)? };
    Ok(token_account.amount())
}

impl<'a> TryFrom<&'a [AccountView]> for SwapAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        let [user, user_x, user_y, state, custody_x, custody_y, token_program] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        if !user.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }

        // ============ Token Program 验证 ============
        if token_program.address() != &TOKEN_PROGRAM_ID {
            return Err(ProgramError::IncorrectProgramId);
        }

        // ============ 状态账户与代币账户关系验证 ============
        {
            let exchange = ExchangeState::load(state)?;

            // 托管账户必须正是状态 PDA 的关联代币账户
            if &custody_address(state.address(), exchange.mint_x()) != custody_x.address()
                || &custody_address(state.address(), exchange.mint_y()) != custody_y.address()
            {
                return Err(ProgramError::InvalidAccountData);
            }
            check_token_account(custody_x, exchange.mint_x(), state.address())?;
            check_token_account(custody_y, exchange.mint_y(), state.address())?;

            // 用户账户必须持有对应资产且属于签名用户
            check_token_account(user_x, exchange.mint_x(), user.address())?;
            check_token_account(user_y, exchange.mint_y(), user.address())?;
        }

        Ok(Self {
            user,
            user_x,
            user_y,
            state,
            custody_x,
            custody_y,
            token_program,
        })
    }
}

impl<'a> SwapAccounts<'a> {
    /// 按输入资产选出 (用户输入, 托管输入, 托管输出, 用户输出)
    #[inline(always)]
    fn legs(
        &self,
        input_is_x: bool,
    ) -> (
        &'a AccountView,
        &'a AccountView,
        &'a AccountView,
        &'a AccountView,
    ) {
        if input_is_x {
            (self.user_x, self.custody_x, self.custody_y, self.user_y)
        } else {
            (self.user_y, self.custody_y, self.custody_x, self.user_x)
        }
    }

    /// 余额预检后执行两笔转账：用户 → 托管（用户签名），托管 → 用户（状态 PDA 签名）。
    /// 任一转账失败时整条指令回滚。
    fn settle(&self, quote: &Quote, input_is_x: bool) -> ProgramResult {
        let (user_in, custody_in, custody_out, user_out) = self.legs(input_is_x);

        if token_balance(user_in)? < quote.amount_in {
            return Err(ProtocolError::UserInsufficientBalance.into());
        }
        if token_balance(custody_out)? < quote.amount_out {
            return Err(ProtocolError::VaultInsufficientFunds.into());
        }

        let (mint_x, mint_y, bump) = {
            let exchange = ExchangeState::load(self.state)?;
            (*exchange.mint_x(), *exchange.mint_y(), exchange.bump())
        };
        let state_seeds = [
            Seed::from(EXCHANGE_SEED),
            Seed::from(mint_x.as_ref()),
            Seed::from(mint_y.as_ref()),
            Seed::from(&bump),
        ];
        let signer = [Signer::from(&state_seeds)];

        Transfer {
            from: user_in,
            to: custody_in,
            authority: self.user,
            amount: quote.amount_in,
        }
        .invoke()?;

        Transfer {
            from: custody_out,
            to: user_out,
            authority: self.state,
            amount: quote.amount_out,
        }
        .invoke_signed(&signer)?;

        Ok(())
    }

    /// 读取当前价格与点差，价格为 0 时直接拒绝
    #[inline(always)]
    fn params(&self) -> Result<(u64, u16), ProgramError> {
        let exchange = ExchangeState::load(self.state)?;
        if !exchange.trading_enabled() {
            log!("swap rejected: trading disabled");
            return Err(ProtocolError::TradingDisabled.into());
        }
        Ok((exchange.scaled_price(), exchange.spread_bps()))
    }
}

/// ========== 交换指令的数据结构 ==========
///
/// 精确输入：is_x 指输入资产，amount 为输入数量，limit 为最少输出。
/// 精确输出：is_x 指输出资产，amount 为输出数量，limit 为最多输入。
#[repr(C, packed)]
pub struct SwapInstructionData {
    /// 1 表示资产 X，0 表示资产 Y
    pub is_x: u8,
    pub amount: u64,
    /// 滑点保护边界
    pub limit: u64,
    /// 交易过期时间（Unix 时间戳，0 表示不限制）
    pub expiration: i64,
}

impl<'a> TryFrom<&'a [u8]> for SwapInstructionData {
    type Error = ProgramError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        const SWAP_DATA_LEN: usize = size_of::<u8>() + size_of::<u64>() * 2 + size_of::<i64>();
        if data.len() != SWAP_DATA_LEN {
            return Err(ProgramError::InvalidInstructionData);
        }

        let instruction_data = unsafe { (data.as_ptr() as *const Self).read_unaligned() };

        if instruction_data.is_x > 1 {
            return Err(ProgramError::InvalidInstructionData);
        }
        if instruction_data.amount == 0 {
            return Err(ProtocolError::ZeroAmount.into());
        }

        Ok(instruction_data)
    }
}

impl SwapInstructionData {
    #[inline(always)]
    pub fn is_x(&self) -> bool {
        self.is_x == 1
    }
}

/// 过期检查，expiration 为 0 时不限制
#[inline(always)]
pub fn check_expiration(expiration: i64, now: i64) -> Result<(), ProtocolError> {
    if expiration != 0 && now > expiration {
        return Err(ProtocolError::Expired);
    }
    Ok(())
}

/// ========== SwapExactIn 指令 ==========
///
/// 用户固定投入数量，按参考价扣除点差后得到输出。
pub struct SwapExactIn<'a> {
    pub accounts: SwapAccounts<'a>,
    pub instruction_data: SwapInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for SwapExactIn<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = SwapAccounts::try_from(accounts)?;
        let instruction_data = SwapInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> SwapExactIn<'a> {
    pub const DISCRIMINATOR: &'a u8 = &6;

    pub fn process(&mut self) -> ProgramResult {
        check_expiration(self.instruction_data.expiration, Clock::get()?.unix_timestamp)?;

        let (scaled_price, spread_bps) = self.accounts.params()?;
        let input_is_x = self.instruction_data.is_x();
        let quote = quote_exact_in(
            scaled_price,
            spread_bps,
            self.instruction_data.amount,
            input_is_x,
            self.instruction_data.limit,
        )
        .inspect_err(|e| {
            if *e == ProtocolError::OutputTooSmall {
                log!("swap_exact_in rejected: output below minimum");
            }
        })?;

        self.accounts.settle(&quote, input_is_x)?;

        let Quote {
            amount_in,
            amount_out,
            fee,
            ..
        } = quote;
        log!("swap_exact_in: in {} out {} fee {}", amount_in, amount_out, fee);
        Ok(())
    }
}

/// ========== SwapExactOut 指令 ==========
///
/// 用户要求恰好拿到指定输出，所需输入向上取整。
pub struct SwapExactOut<'a> {
    pub accounts: SwapAccounts<'a>,
    pub instruction_data: SwapInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for SwapExactOut<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = SwapAccounts::try_from(accounts)?;
        let instruction_data = SwapInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> SwapExactOut<'a> {
    pub const DISCRIMINATOR: &'a u8 = &7;

    pub fn process(&mut self) -> ProgramResult {
        check_expiration(self.instruction_data.expiration, Clock::get()?.unix_timestamp)?;

        let (scaled_price, spread_bps) = self.accounts.params()?;
        let output_is_x = self.instruction_data.is_x();
        let quote = quote_exact_out(
            scaled_price,
            spread_bps,
            self.instruction_data.amount,
            output_is_x,
            self.instruction_data.limit,
        )
        .inspect_err(|e| {
            if *e == ProtocolError::InputTooLarge {
                log!("swap_exact_out rejected: input above maximum");
            }
        })?;

        // 输出 X 时用户投入的是 Y
        self.accounts.settle(&quote, !output_is_x)?;

        let Quote {
            amount_in,
            amount_out,
            fee,
            ..
        } = quote;
        log!("swap_exact_out: in {} out {} fee {}", amount_in, amount_out, fee);
        Ok(())
    }
}
