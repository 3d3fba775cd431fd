use crate::authority::{is_administrator, SignerSet};
use crate::constants::MAX_SPREAD_BPS;
use crate::errors::ProtocolError;
use crate::state::ExchangeState;
use core::mem::size_of;
use pinocchio::{error::ProgramError, AccountView, ProgramResult};
use pinocchio_log::log;

/// ========== 管理员指令所需的账户 ==========
///
/// UpdateParams 与 UpdatePrice 共用。
pub struct AdminAccounts<'a> {
    /// 管理员（必须签名，且与状态账户记录一致）
    pub administrator: &'a AccountView,
    /// 兑换状态账户
    pub state: &'a AccountView,
}

impl<'a> TryFrom<&'a [AccountView]> for AdminAccounts<'a> {
    type Error = ProgramError;

    fn try_from(accounts: &'a [AccountView]) -> Result<Self, Self::Error> {
        let [administrator, state] = accounts else {
            return Err(ProgramError::NotEnoughAccountKeys);
        };

        if !administrator.is_signer() {
            return Err(ProgramError::MissingRequiredSignature);
        }

        {
            let exchange = ExchangeState::load(state)?;
            let signers = SignerSet::from_accounts([administrator]);
            if !is_administrator(&signers, exchange.administrator()) {
                log!("params update rejected: signer is not the administrator");
                return Err(ProtocolError::NotAdministrator.into());
            }
        }

        Ok(Self {
            administrator,
            state,
        })
    }
}

/// 读取一个可选字段：标签 0 表示缺省，标签 1 后跟 N 字节小端值
fn split_option<const N: usize>(data: &[u8]) -> Result<(Option<[u8; N]>, &[u8]), ProgramError> {
    match data.split_first() {
        Some((0, rest)) => Ok((None, rest)),
        Some((1, rest)) if rest.len() >= N => {
            let (value, rest) = rest.split_at(N);
            let value =
                <[u8; N]>::try_from(value).map_err(|_| ProgramError::InvalidInstructionData)?;
            Ok((Some(value), rest))
        }
        _ => Err(ProgramError::InvalidInstructionData),
    }
}

/// ========== UpdateParams 指令数据 ==========
#[derive(Debug, PartialEq, Eq)]
pub struct UpdateParamsInstructionData {
    /// 新的 scaled_price，None 表示不变
    pub new_price: Option<u64>,
    /// 新的点差，None 表示不变
    pub new_spread: Option<u16>,
}

impl<'a> TryFrom<&'a [u8]> for UpdateParamsInstructionData {
    type Error = ProgramError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        let (new_price, rest) = split_option::<8>(data)?;
        let (new_spread, rest) = split_option::<2>(rest)?;
        if !rest.is_empty() {
            return Err(ProgramError::InvalidInstructionData);
        }

        let new_spread = new_spread.map(u16::from_le_bytes);
        if matches!(new_spread, Some(spread_bps) if spread_bps > MAX_SPREAD_BPS) {
            return Err(ProtocolError::InvalidSpread.into());
        }

        Ok(Self {
            new_price: new_price.map(u64::from_le_bytes),
            new_spread,
        })
    }
}

/// ========== UpdateParams 指令 ==========
///
/// 管理员按字段更新价格和点差，缺省字段保持不变。
pub struct UpdateParams<'a> {
    pub accounts: AdminAccounts<'a>,
    pub instruction_data: UpdateParamsInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for UpdateParams<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = AdminAccounts::try_from(accounts)?;
        let instruction_data = UpdateParamsInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> UpdateParams<'a> {
    pub const DISCRIMINATOR: &'a u8 = &4;

    pub fn process(&mut self) -> ProgramResult {
        let mut state = ExchangeState::load_mut(self.accounts.state)?;
        state.apply_params(
            self.instruction_data.new_price,
            self.instruction_data.new_spread,
        )?;

        let (scaled_price, spread_bps) = (state.scaled_price(), state.spread_bps());
        log!(
            "params updated, price: {}, spread: {} bps",
            scaled_price,
            spread_bps
        );
        Ok(())
    }
}

/// ========== UpdatePrice 指令数据 ==========
#[repr(C, packed)]
pub struct UpdatePriceInstructionData {
    pub scaled_price: u64,
}

impl<'a> TryFrom<&'a [u8]> for UpdatePriceInstructionData {
    type Error = ProgramError;

    fn try_from(data: &'a [u8]) -> Result<Self, Self::Error> {
        if data.len() != size_of::<u64>() {
            return Err(ProgramError::InvalidInstructionData);
        }
        Ok(unsafe { (data.as_ptr() as *const Self).read_unaligned() })
    }
}

/// ========== UpdatePrice 指令 ==========
///
/// 只改价格，等价于 UpdateParams(Some(price), None)。
pub struct UpdatePrice<'a> {
    pub accounts: AdminAccounts<'a>,
    pub instruction_data: UpdatePriceInstructionData,
}

impl<'a> TryFrom<(&'a [u8], &'a [AccountView])> for UpdatePrice<'a> {
    type Error = ProgramError;

    fn try_from((data, accounts): (&'a [u8], &'a [AccountView])) -> Result<Self, Self::Error> {
        let accounts = AdminAccounts::try_from(accounts)?;
        let instruction_data = UpdatePriceInstructionData::try_from(data)?;

        Ok(Self {
            accounts,
            instruction_data,
        })
    }
}

impl<'a> UpdatePrice<'a> {
    pub const DISCRIMINATOR: &'a u8 = &5;

    pub fn process(&mut self) -> ProgramResult {
        let scaled_price = self.instruction_data.scaled_price;
        let mut state = ExchangeState::load_mut(self.accounts.state)?;
        state.apply_params(Some(scaled_price), None)?;

        log!("price updated: {}", scaled_price);
        Ok(())
    }
}
