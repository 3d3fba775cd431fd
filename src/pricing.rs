use crate::constants::{BPS_SCALE, MAX_SPREAD_BPS, PRICE_SCALE};
use crate::errors::ProtocolError;

/// ========== 定价引擎 ==========
///
/// 纯函数：给定管理员设定的 scaled_price 与 spread_bps，计算精确输入/精确输出
/// 两种模式下的成交数量。所有乘法都在 u128 中完成，结果放不回 u64 时报 MathOverflow。
///
/// 舍入方向始终有利于金库：支付给用户的数量向下取整，向用户收取的数量向上取整。

/// 兑换方向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// amount_y = amount_x * price / PRICE_SCALE
    XToY,
    /// amount_x = amount_y * PRICE_SCALE / price
    YToX,
}

impl Direction {
    /// 待换算的数量以 X 计价时为 X→Y，否则为 Y→X
    #[inline(always)]
    pub fn of_amount(amount_is_x: bool) -> Self {
        if amount_is_x {
            Direction::XToY
        } else {
            Direction::YToX
        }
    }
}

/// 整数除法的舍入方式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Down,
    Up,
}

/// 一笔交易的报价结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quote {
    /// 用户转入托管账户的数量
    pub amount_in: u64,
    /// 托管账户转给用户的数量
    pub amount_out: u64,
    /// 扣点差前的输出数量
    pub gross_out: u64,
    /// 留在托管账户中的点差
    pub fee: u64,
}

/// a * b / d，按指定方向舍入
#[inline(always)]
fn mul_div(a: u128, b: u128, d: u128, rounding: Rounding) -> Result<u64, ProtocolError> {
    if d == 0 {
        return Err(ProtocolError::DivisionByZero);
    }
    let product = a.checked_mul(b).ok_or(ProtocolError::MathOverflow)?;
    let quotient = product / d;
    let quotient = match rounding {
        Rounding::Down => quotient,
        Rounding::Up if product % d != 0 => quotient + 1,
        Rounding::Up => quotient,
    };
    u64::try_from(quotient).map_err(|_| ProtocolError::MathOverflow)
}

/// 按参考价换算数量
pub fn convert(
    amount: u64,
    scaled_price: u64,
    direction: Direction,
    rounding: Rounding,
) -> Result<u64, ProtocolError> {
    if scaled_price == 0 {
        return Err(ProtocolError::TradingDisabled);
    }
    match direction {
        Direction::XToY => mul_div(amount as u128, scaled_price as u128, PRICE_SCALE, rounding),
        Direction::YToX => mul_div(amount as u128, PRICE_SCALE, scaled_price as u128, rounding),
    }
}

/// 从输出腿扣除的点差，向下取整
#[inline(always)]
pub fn spread_fee(gross_out: u64, spread_bps: u16) -> Result<u64, ProtocolError> {
    mul_div(gross_out as u128, spread_bps as u128, BPS_SCALE, Rounding::Down)
}

/// ========== 精确输入 ==========
///
/// 用户固定投入 `input_amount`，得到 `gross_out - fee`，不足 `min_out` 时拒绝。
pub fn quote_exact_in(
    scaled_price: u64,
    spread_bps: u16,
    input_amount: u64,
    input_is_x: bool,
    min_out: u64,
) -> Result<Quote, ProtocolError> {
    if scaled_price == 0 {
        return Err(ProtocolError::TradingDisabled);
    }
    if input_amount == 0 {
        return Err(ProtocolError::ZeroAmount);
    }
    if spread_bps > MAX_SPREAD_BPS {
        return Err(ProtocolError::InvalidSpread);
    }

    let gross_out = convert(
        input_amount,
        scaled_price,
        Direction::of_amount(input_is_x),
        Rounding::Down,
    )?;
    let fee = spread_fee(gross_out, spread_bps)?;
    let net_out = gross_out
        .checked_sub(fee)
        .ok_or(ProtocolError::MathOverflow)?;

    if net_out < min_out {
        return Err(ProtocolError::OutputTooSmall);
    }
    if net_out == 0 {
        return Err(ProtocolError::ZeroOutput);
    }

    Ok(Quote {
        amount_in: input_amount,
        amount_out: net_out,
        gross_out,
        fee,
    })
}

/// ========== 精确输出 ==========
///
/// 用户要求恰好拿到 `output_amount`。先反推扣点差前的 gross_out（向上取整），
/// 再换算成输入资产得到所需输入（同样向上取整），超过 `max_in` 时拒绝。
/// 点差为 100% 时任何正输出都无法满足。
pub fn quote_exact_out(
    scaled_price: u64,
    spread_bps: u16,
    output_amount: u64,
    output_is_x: bool,
    max_in: u64,
) -> Result<Quote, ProtocolError> {
    if scaled_price == 0 {
        return Err(ProtocolError::TradingDisabled);
    }
    if output_amount == 0 {
        return Err(ProtocolError::ZeroAmount);
    }
    if spread_bps > MAX_SPREAD_BPS {
        return Err(ProtocolError::InvalidSpread);
    }
    if spread_bps == MAX_SPREAD_BPS {
        return Err(ProtocolError::UnsatisfiableSpread);
    }

    let gross_out = mul_div(
        output_amount as u128,
        BPS_SCALE,
        BPS_SCALE - spread_bps as u128,
        Rounding::Up,
    )?;

    // gross_out 以输出资产计价，换算成另一种资产即为所需输入
    let required_in = convert(
        gross_out,
        scaled_price,
        Direction::of_amount(output_is_x),
        Rounding::Up,
    )?;

    if required_in > max_in {
        return Err(ProtocolError::InputTooLarge);
    }

    Ok(Quote {
        amount_in: required_in,
        amount_out: output_amount,
        gross_out,
        fee: gross_out - output_amount,
    })
}
