// =============================================================================
// Average Directional Index (ADX) with +DI / -DI
// =============================================================================
//
// Calculation pipeline:
//   1. +DM / -DM and True Range per bar.
//   2. Wilder's smoothing (period) of +DM, -DM and TR.
//   3. +DI = smoothed(+DM) / smoothed(TR) * 100, -DI likewise.
//   4. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   5. ADX = Wilder's smoothed average of DX over `period` bars.
//
// ADX measures trend strength; the DI pair gives the direction.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

/// Latest ADX reading together with the directional indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdxReading {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Compute the most recent ADX / +DI / -DI from candles (oldest first).
///
/// Requires at least `2 * period + 1` candles. Returns `None` on a zero
/// period, short input, a zero true range or any non-finite intermediate.
pub fn calculate_adx(candles: &[Candle], period: usize) -> Option<AdxReading> {
    if period == 0 || candles.len() < 2 * period + 1 {
        return None;
    }

    let period_f = period as f64;

    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    let mut tr_vals = Vec::with_capacity(candles.len() - 1);

    for pair in candles.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);

        let tr = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        tr_vals.push(tr);
    }

    let mut s_plus: f64 = plus_dm[..period].iter().sum();
    let mut s_minus: f64 = minus_dm[..period].iter().sum();
    let mut s_tr: f64 = tr_vals[..period].iter().sum();

    let mut di = directional_indices(s_plus, s_minus, s_tr)?;
    let mut dx_values = vec![dx_from(di)];

    for i in period..tr_vals.len() {
        s_plus = s_plus - s_plus / period_f + plus_dm[i];
        s_minus = s_minus - s_minus / period_f + minus_dm[i];
        s_tr = s_tr - s_tr / period_f + tr_vals[i];

        di = directional_indices(s_plus, s_minus, s_tr)?;
        dx_values.push(dx_from(di));
    }

    if dx_values.len() < period {
        return None;
    }

    let mut adx = dx_values[..period].iter().sum::<f64>() / period_f;
    for &dx in &dx_values[period..] {
        adx = (adx * (period_f - 1.0) + dx) / period_f;
    }

    if !adx.is_finite() {
        return None;
    }

    Some(AdxReading {
        adx,
        plus_di: di.0,
        minus_di: di.1,
    })
}

fn directional_indices(s_plus: f64, s_minus: f64, s_tr: f64) -> Option<(f64, f64)> {
    if s_tr == 0.0 {
        return None;
    }
    let plus_di = s_plus / s_tr * 100.0;
    let minus_di = s_minus / s_tr * 100.0;
    (plus_di.is_finite() && minus_di.is_finite()).then_some((plus_di, minus_di))
}

fn dx_from((plus_di, minus_di): (f64, f64)) -> f64 {
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        (plus_di - minus_di).abs() / sum * 100.0
    }
}
