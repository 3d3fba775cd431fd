use core::{mem::size_of, ptr};
use pinocchio::{
    account::{RuntimeAccount, NOT_BORROWED},
    AccountView, Address,
};
use pinocchio_token::state::TokenAccount;

use crate::state::{ExchangeState, Vault};

/// ========== 宿主测试账户 ==========
///
/// 按运行时的内存布局构造账户：RuntimeAccount 头后紧跟数据区，8 字节对齐。
/// 账户视图只持有裸指针，TestAccount 必须活得比它的视图久。
pub struct TestAccount {
    backing: Vec<u64>,
}

impl TestAccount {
    pub fn new(address: Address, owner: Address, lamports: u64, data: &[u8]) -> Self {
        let header = size_of::<RuntimeAccount>();
        let mut backing = vec![0u64; (header + data.len()).div_ceil(size_of::<u64>())];

        let raw = backing.as_mut_ptr() as *mut RuntimeAccount;
        unsafe {
            raw.write(RuntimeAccount {
                borrow_state: NOT_BORROWED,
                is_signer: 0,
                is_writable: 1,
                executable: 0,
                resize_delta: 0,
                address,
                owner,
                lamports,
                data_len: data.len() as u64,
            });
            ptr::copy_nonoverlapping(data.as_ptr(), (raw as *mut u8).add(header), data.len());
        }

        Self { backing }
    }

    /// 没有数据的系统账户，例如钱包
    pub fn wallet(address: Address, lamports: u64) -> Self {
        Self::new(address, pinocchio_system::ID, lamports, &[])
    }

    /// SPL Token 账户：mint、持有人和余额，状态为已初始化
    pub fn token(address: Address, mint: &Address, holder: &Address, amount: u64) -> Self {
        let mut data = [0u8; TokenAccount::LEN];
        data[..32].copy_from_slice(mint.as_ref());
        data[32..64].copy_from_slice(holder.as_ref());
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data[108] = 1;
        Self::new(address, pinocchio_token::ID, 0, &data)
    }

    pub fn signer(mut self) -> Self {
        self.header_mut().is_signer = 1;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.header_mut().is_writable = 0;
        self
    }

    pub fn view(&mut self) -> AccountView {
        unsafe { AccountView::new_unchecked(self.backing.as_mut_ptr() as *mut RuntimeAccount) }
    }

    fn header_mut(&mut self) -> &mut RuntimeAccount {
        unsafe { &mut *(self.backing.as_mut_ptr() as *mut RuntimeAccount) }
    }
}

/// 已写入委托人的金库数据
pub fn vault_data(principal_a: Address, principal_b: Address, bump: u8) -> [u8; Vault::LEN] {
    let mut data = [0u8; Vault::LEN];
    let vault = unsafe { Vault::from_bytes_unchecked_mut(&mut data) };
    vault.set_inner(principal_a, principal_b, [bump]);
    data
}

/// 已初始化并设置好价格的兑换状态数据
pub fn exchange_data(
    administrator: Address,
    mint_x: Address,
    mint_y: Address,
    spread_bps: u16,
    scaled_price: u64,
    bump: u8,
) -> [u8; ExchangeState::LEN] {
    let mut data = [0u8; ExchangeState::LEN];
    let state = unsafe { ExchangeState::from_bytes_unchecked_mut(&mut data) };
    state
        .set_inner(administrator, mint_x, mint_y, spread_bps, [bump])
        .unwrap();
    state.set_scaled_price(scaled_price);
    data
}
