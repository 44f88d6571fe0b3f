// =============================================================================
// Oscillator bots - RSI, stochastic, Williams %R, CCI, MFI, ROC
// =============================================================================
//
// Mostly mean-reversion calls at the extremes of bounded oscillators, plus a
// couple of momentum-confirmation bots in the middle of the range.

use super::{BotInputs, BotSpec, Setup};
use crate::indicators::rsi::{calculate_rsi, OVERBOUGHT, OVERSOLD};
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "rsi_extreme", category: BotCategory::Oscillator, run: rsi_extreme },
    BotSpec { name: "rsi_momentum", category: BotCategory::Oscillator, run: rsi_momentum },
    BotSpec { name: "stochastic_extreme", category: BotCategory::Oscillator, run: stochastic_extreme },
    BotSpec { name: "williams_r", category: BotCategory::Oscillator, run: williams_r },
    BotSpec { name: "cci_extreme", category: BotCategory::Oscillator, run: cci_extreme },
    BotSpec { name: "mfi_extreme", category: BotCategory::Oscillator, run: mfi_extreme },
    BotSpec { name: "roc_momentum", category: BotCategory::Oscillator, run: roc_momentum },
    BotSpec { name: "rsi_divergence", category: BotCategory::Oscillator, run: rsi_divergence },
    BotSpec { name: "stoch_rsi_combo", category: BotCategory::Oscillator, run: stoch_rsi_combo },
    BotSpec { name: "momentum_burst", category: BotCategory::Oscillator, run: momentum_burst },
];

/// Confidence added per RSI point beyond the threshold.
const RSI_CONF_PER_POINT: f64 = 0.026;

/// Oversold -> LONG, overbought -> SHORT. Needs nothing but RSI and a price.
fn rsi_extreme(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let rsi = i.indicators.rsi.filter(|r| r.is_finite())?;
    let (dir, excess) = if rsi < OVERSOLD {
        (Direction::Long, OVERSOLD - rsi)
    } else if rsi > OVERBOUGHT {
        (Direction::Short, rsi - OVERBOUGHT)
    } else {
        return None;
    };
    let conf = 0.70 + excess * RSI_CONF_PER_POINT;
    Some(Setup::at_pct(dir, conf, price, 3.0, 1.5))
}

/// RSI leaning one way with the MACD histogram confirming.
fn rsi_momentum(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let rsi = i.indicators.rsi?;
    let hist = i.indicators.macd?.histogram;
    let dir = if (55.0..OVERBOUGHT).contains(&rsi) && hist > 0.0 {
        Direction::Long
    } else if rsi > OVERSOLD && rsi <= 45.0 && hist < 0.0 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.55 + (rsi - 50.0).abs() / 100.0;
    Some(Setup::at_atr_or_pct(dir, conf, price, i.indicators.atr, (2.5, 1.5), (3.0, 1.5)))
}

/// %K in the extreme zone and already turning through %D.
fn stochastic_extreme(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let st = i.indicators.stochastic?;
    let (dir, excess) = if st.k < 20.0 && st.k > st.d {
        (Direction::Long, 20.0 - st.k)
    } else if st.k > 80.0 && st.k < st.d {
        (Direction::Short, st.k - 80.0)
    } else {
        return None;
    };
    let conf = 0.6 + excess / 100.0;
    Some(Setup::at_pct(dir, conf, price, 2.5, 1.25))
}

fn williams_r(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let w = i.indicators.williams_r?;
    let dir = if w < -80.0 {
        Direction::Long
    } else if w > -20.0 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.55 + ((w + 50.0).abs() - 30.0) / 100.0;
    Some(Setup::at_pct(dir, conf, price, 2.5, 1.25))
}

fn cci_extreme(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let cci = i.indicators.cci?;
    let dir = if cci < -100.0 {
        Direction::Long
    } else if cci > 100.0 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.55 + ((cci.abs() - 100.0) / 400.0).min(0.3);
    Some(Setup::at_pct(dir, conf, price, 3.0, 1.5))
}

fn mfi_extreme(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let mfi = i.indicators.mfi?;
    let (dir, excess) = if mfi < 20.0 {
        (Direction::Long, 20.0 - mfi)
    } else if mfi > 80.0 {
        (Direction::Short, mfi - 80.0)
    } else {
        return None;
    };
    let conf = 0.6 + excess / 100.0;
    Some(Setup::at_pct(dir, conf, price, 3.0, 1.5))
}

/// Rate of change beyond 3% with price on the matching side of EMA20.
fn roc_momentum(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let roc = i.indicators.roc?;
    let e20 = i.indicators.ema20?;
    let dir = if roc > 3.0 && price > e20 {
        Direction::Long
    } else if roc < -3.0 && price < e20 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.5 + (roc.abs() / 30.0).min(0.3);
    Some(Setup::at_atr_or_pct(dir, conf, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)))
}

const DIVERGENCE_WINDOW: usize = 20;
const DIVERGENCE_RECENT: usize = 5;

/// Price makes a new extreme over the window while RSI does not.
fn rsi_divergence(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let closes = i.indicators.closes();
    let rsi = calculate_rsi(&closes, 14);
    if rsi.len() < DIVERGENCE_WINDOW {
        return None;
    }
    // rsi[k] belongs to closes[k + 14]; both tails end on the same bar.
    let px = &closes[closes.len() - DIVERGENCE_WINDOW..];
    let rs = &rsi[rsi.len() - DIVERGENCE_WINDOW..];
    let split = DIVERGENCE_WINDOW - DIVERGENCE_RECENT;

    let min = |xs: &[f64]| xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = |xs: &[f64]| xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let dir = if min(&px[split..]) < min(&px[..split]) && min(&rs[split..]) > min(&rs[..split]) + 2.0 {
        Direction::Long
    } else if max(&px[split..]) > max(&px[..split]) && max(&rs[split..]) < max(&rs[..split]) - 2.0 {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_atr_or_pct(dir, 0.65, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)))
}

/// RSI and stochastic both stretched the same way.
fn stoch_rsi_combo(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let rsi = i.indicators.rsi?;
    let k = i.indicators.stochastic?.k;
    let dir = if rsi < 40.0 && k < 25.0 {
        Direction::Long
    } else if rsi > 60.0 && k > 75.0 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.6 + ((rsi - 50.0).abs() / 100.0).min(0.25);
    Some(Setup::at_pct(dir, conf, price, 3.0, 1.5))
}

/// Three consecutive same-colour candles with rising volume.
fn momentum_burst(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let last = i.indicators.last_candles(3)?;
    let rising_volume = last[1].volume > last[0].volume && last[2].volume > last[1].volume;
    if !rising_volume {
        return None;
    }
    let all_up = last.iter().all(|c| c.close > c.open) && last.windows(2).all(|w| w[1].close > w[0].close);
    let all_down = last.iter().all(|c| c.close < c.open) && last.windows(2).all(|w| w[1].close < w[0].close);
    let dir = match (all_up, all_down) {
        (true, false) => Direction::Long,
        (false, true) => Direction::Short,
        _ => return None,
    };
    Some(Setup::at_atr_or_pct(dir, 0.55, price, i.indicators.atr, (2.0, 1.0), (2.5, 1.25)))
}
