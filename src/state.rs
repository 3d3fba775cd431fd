use crate::constants::{EXCHANGE_DISCRIMINATOR, MAX_SPREAD_BPS, VAULT_DISCRIMINATOR};
use crate::errors::ProtocolError;
use core::mem::size_of;
use pinocchio::{
    account::{Ref, RefMut},
    error::ProgramError,
    AccountView, Address,
};

/// 校验账户长度、所有者和类型鉴别器，通过后返回只读借用
#[inline(always)]
fn checked_borrow<'a>(
    account_view: &'a AccountView,
    len: usize,
    discriminator: u8,
) -> Result<Ref<'a, [u8]>, ProgramError> {
    if account_view.data_len() != len {
        return Err(ProgramError::InvalidAccountData);
    }
    if !account_view.owned_by(&crate::ID) {
        return Err(ProgramError::InvalidAccountOwner);
    }
    let data = account_view.try_borrow()?;
    if data[0] != discriminator {
        return Err(ProgramError::InvalidAccountData);
    }
    Ok(data)
}

/// 可变版本的 checked_borrow
#[inline(always)]
fn checked_borrow_mut<'a>(
    account_view: &'a AccountView,
    len: usize,
    discriminator: u8,
) -> Result<RefMut<'a, [u8]>, ProgramError> {
    if account_view.data_len() != len {
        return Err(ProgramError::InvalidAccountData);
    }
    if !account_view.owned_by(&crate::ID) {
        return Err(ProgramError::InvalidAccountOwner);
    }
    let data = account_view.try_borrow_mut()?;
    if data[0] != discriminator {
        return Err(ProgramError::InvalidAccountData);
    }
    Ok(data)
}

/// ========== 共管金库账户 ==========
///
/// 托管原生币（lamports）的账户，余额就是账户自身的 lamports，
/// 数据区只记录两位委托人。地址由 (principal_a, principal_b) 按顺序推导。
#[repr(C, packed)]
pub struct Vault {
    /// 账户类型鉴别器，固定为 VAULT_DISCRIMINATOR
    discriminator: u8,
    /// 第一位委托人，也是提款的收款方
    principal_a: Address,
    /// 第二位委托人
    principal_b: Address,
    /// 推导金库 PDA 时的 bump
    bump: [u8; 1],
}

impl Vault {
    pub const LEN: usize = size_of::<Vault>();

    /// 加载金库账户（只读），校验长度、所有者和鉴别器
    #[inline(always)]
    pub fn load<'a>(account_view: &'a AccountView) -> Result<Ref<'a, Self>, ProgramError> {
        let data = checked_borrow(account_view, Self::LEN, VAULT_DISCRIMINATOR)?;
        Ok(Ref::map(data, |data| unsafe { Self::from_bytes_unchecked(data) }))
    }

    /// 强制以可变引用加载账户数据，只检查长度 (用于刚创建的账户)
    ///
    /// # Safety
    /// 调用者必须确保账户由本程序刚刚创建，且当前没有其他借用
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub unsafe fn load_mut_unchecked(account_view: &AccountView) -> Result<&mut Self, ProgramError> {
        if account_view.data_len() != Self::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { Self::from_bytes_unchecked_mut(account_view.borrow_unchecked_mut()) })
    }

    /// # Safety
    /// `bytes` 长度至少为 `Vault::LEN`
    #[inline(always)]
    pub unsafe fn from_bytes_unchecked(bytes: &[u8]) -> &Self {
        unsafe { &*(bytes.as_ptr() as *const Vault) }
    }

    /// # Safety
    /// `bytes` 长度至少为 `Vault::LEN`
    #[inline(always)]
    pub unsafe fn from_bytes_unchecked_mut(bytes: &mut [u8]) -> &mut Self {
        unsafe { &mut *(bytes.as_mut_ptr() as *mut Vault) }
    }

    #[inline(always)]
    pub fn principal_a(&self) -> &Address {
        &self.principal_a
    }

    #[inline(always)]
    pub fn principal_b(&self) -> &Address {
        &self.principal_b
    }

    #[inline(always)]
    pub fn bump(&self) -> [u8; 1] {
        self.bump
    }

    /// 存款时的受益人必须是两位委托人之一
    #[inline(always)]
    pub fn is_principal(&self, key: &Address) -> bool {
        self.principal_a() == key || self.principal_b() == key
    }

    #[inline(always)]
    pub fn set_inner(&mut self, principal_a: Address, principal_b: Address, bump: [u8; 1]) {
        self.discriminator = VAULT_DISCRIMINATOR;
        self.principal_a = principal_a;
        self.principal_b = principal_b;
        self.bump = bump;
    }
}

/// ========== 兑换状态账户 ==========
///
/// 保存管理员、交易对、参考价和点差。该账户同时是两个托管代币账户的 owner，
/// 只有本程序能以它的名义签名转出托管资产。
#[repr(C, packed)]
pub struct ExchangeState {
    /// 账户类型鉴别器，固定为 EXCHANGE_DISCRIMINATOR
    discriminator: u8,
    /// 唯一有权修改价格和点差的地址
    administrator: Address,
    /// 资产 X 的 mint
    mint_x: Address,
    /// 资产 Y 的 mint
    mint_y: Address,
    /// 点差（bps，范围 0-10000），从每笔交易的输出腿扣除
    spread_bps: [u8; 2],
    /// 每单位 X 可换的 Y，乘以 PRICE_SCALE；0 表示尚未开放交易
    scaled_price: [u8; 8],
    /// 推导状态账户 PDA 时的 bump
    bump: [u8; 1],
}

impl ExchangeState {
    pub const LEN: usize = size_of::<ExchangeState>();

    /// 加载兑换状态（只读）
    #[inline(always)]
    pub fn load<'a>(account_view: &'a AccountView) -> Result<Ref<'a, Self>, ProgramError> {
        let data = checked_borrow(account_view, Self::LEN, EXCHANGE_DISCRIMINATOR)?;
        Ok(Ref::map(data, |data| unsafe { Self::from_bytes_unchecked(data) }))
    }

    /// 加载兑换状态（可变）
    #[inline(always)]
    pub fn load_mut<'a>(account_view: &'a AccountView) -> Result<RefMut<'a, Self>, ProgramError> {
        let data = checked_borrow_mut(account_view, Self::LEN, EXCHANGE_DISCRIMINATOR)?;
        Ok(RefMut::map(data, |data| unsafe {
            Self::from_bytes_unchecked_mut(data)
        }))
    }

    /// 强制以可变引用加载账户数据，只检查长度 (用于初始化)
    ///
    /// # Safety
    /// 调用者必须确保账户由本程序刚刚创建，且当前没有其他借用
    #[allow(clippy::mut_from_ref)]
    #[inline(always)]
    pub unsafe fn load_mut_unchecked(account_view: &AccountView) -> Result<&mut Self, ProgramError> {
        if account_view.data_len() != Self::LEN {
            return Err(ProgramError::InvalidAccountData);
        }
        Ok(unsafe { Self::from_bytes_unchecked_mut(account_view.borrow_unchecked_mut()) })
    }

    /// # Safety
    /// `bytes` 长度至少为 `ExchangeState::LEN`
    #[inline(always)]
    pub unsafe fn from_bytes_unchecked(bytes: &[u8]) -> &Self {
        unsafe { &*(bytes.as_ptr() as *const ExchangeState) }
    }

    /// # Safety
    /// `bytes` 长度至少为 `ExchangeState::LEN`
    #[inline(always)]
    pub unsafe fn from_bytes_unchecked_mut(bytes: &mut [u8]) -> &mut Self {
        unsafe { &mut *(bytes.as_mut_ptr() as *mut ExchangeState) }
    }

    // ========== Getter ==========

    #[inline(always)]
    pub fn administrator(&self) -> &Address {
        &self.administrator
    }

    #[inline(always)]
    pub fn mint_x(&self) -> &Address {
        &self.mint_x
    }

    #[inline(always)]
    pub fn mint_y(&self) -> &Address {
        &self.mint_y
    }

    #[inline(always)]
    pub fn spread_bps(&self) -> u16 {
        u16::from_le_bytes(self.spread_bps)
    }

    #[inline(always)]
    pub fn scaled_price(&self) -> u64 {
        u64::from_le_bytes(self.scaled_price)
    }

    #[inline(always)]
    pub fn bump(&self) -> [u8; 1] {
        self.bump
    }

    /// 价格为 0 时所有方向的交易都被禁止
    #[inline(always)]
    pub fn trading_enabled(&self) -> bool {
        self.scaled_price() != 0
    }

    // ========== Setter ==========

    /// 设置点差，超过 10000 bps 时拒绝
    #[inline(always)]
    pub fn set_spread_bps(&mut self, spread_bps: u16) -> Result<(), ProgramError> {
        if spread_bps > MAX_SPREAD_BPS {
            return Err(ProtocolError::InvalidSpread.into());
        }
        self.spread_bps = spread_bps.to_le_bytes();
        Ok(())
    }

    #[inline(always)]
    pub fn set_scaled_price(&mut self, scaled_price: u64) {
        self.scaled_price = scaled_price.to_le_bytes();
    }

    /// 初始化全部字段，价格从 0 开始
    #[inline(always)]
    pub fn set_inner(
        &mut self,
        administrator: Address,
        mint_x: Address,
        mint_y: Address,
        spread_bps: u16,
        bump: [u8; 1],
    ) -> Result<(), ProgramError> {
        self.set_spread_bps(spread_bps)?;
        self.discriminator = EXCHANGE_DISCRIMINATOR;
        self.administrator = administrator;
        self.mint_x = mint_x;
        self.mint_y = mint_y;
        self.set_scaled_price(0);
        self.bump = bump;
        Ok(())
    }

    /// 按字段更新参数，None 表示保持不变。先校验再写入，失败时不改任何字段。
    #[inline(always)]
    pub fn apply_params(
        &mut self,
        new_price: Option<u64>,
        new_spread: Option<u16>,
    ) -> Result<(), ProgramError> {
        if let Some(spread_bps) = new_spread {
            self.set_spread_bps(spread_bps)?;
        }
        if let Some(scaled_price) = new_price {
            self.set_scaled_price(scaled_price);
        }
        Ok(())
    }
}
