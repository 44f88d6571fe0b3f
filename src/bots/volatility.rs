// =============================================================================
// Volatility bots - Bollinger, Keltner, ATR expansion / contraction
// =============================================================================

use super::{direction_of, BotInputs, BotSpec, Setup};
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "bollinger_reversion", category: BotCategory::Volatility, run: bollinger_reversion },
    BotSpec { name: "bollinger_squeeze", category: BotCategory::Volatility, run: bollinger_squeeze },
    BotSpec { name: "atr_breakout", category: BotCategory::Volatility, run: atr_breakout },
    BotSpec { name: "keltner_reversion", category: BotCategory::Volatility, run: keltner_reversion },
    BotSpec { name: "volatility_contraction", category: BotCategory::Volatility, run: volatility_contraction },
    BotSpec { name: "bollinger_walk", category: BotCategory::Volatility, run: bollinger_walk },
];

/// Band width (percent of middle) below which the bands count as squeezed.
const SQUEEZE_WIDTH_PCT: f64 = 4.0;

/// Close outside a band: fade back to the middle band.
fn bollinger_reversion(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let bb = i.indicators.bollinger_bands?;
    let half = bb.middle - bb.lower;
    if half <= 0.0 {
        return None;
    }
    let (dir, excess) = if price < bb.lower {
        (Direction::Long, bb.lower - price)
    } else if price > bb.upper {
        (Direction::Short, price - bb.upper)
    } else {
        return None;
    };
    let conf = 0.6 + (excess / half * 0.5).min(0.3);
    let stop = price - dir.sign() * half * 0.5;
    Some(Setup::at_levels(dir, conf, price, bb.middle, stop))
}

/// Tight bands: trade the expected expansion in the MACD's direction when the
/// price is already on that side of the middle band.
fn bollinger_squeeze(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let bb = i.indicators.bollinger_bands?;
    let hist = i.indicators.macd?.histogram;
    if bb.width_pct()? >= SQUEEZE_WIDTH_PCT {
        return None;
    }
    let dir = direction_of(hist)?;
    if (price - bb.middle) * dir.sign() <= 0.0 {
        return None;
    }
    let band_span = bb.upper - bb.lower;
    Some(Setup::at_levels(
        dir,
        0.6,
        price,
        price + dir.sign() * band_span * 1.5,
        bb.middle,
    ))
}

/// Last bar moved more than 1.5 ATR.
fn atr_breakout(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let atr = i.indicators.atr.filter(|a| *a > 0.0)?;
    let last = i.indicators.last_candles(2)?;
    let moved = last[1].close - last[0].close;
    if moved.abs() <= 1.5 * atr {
        return None;
    }
    let dir = direction_of(moved)?;
    let conf = 0.55 + (moved.abs() / atr / 10.0).min(0.3);
    Some(Setup::at_atr(dir, conf, price, atr, 2.0, 1.0))
}

/// Price stretched more than 2.5 ATR from EMA20: fade to the EMA.
fn keltner_reversion(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let e20 = i.indicators.ema20?;
    let atr = i.indicators.atr.filter(|a| *a > 0.0)?;
    let stretch = (price - e20) / atr;
    if stretch.abs() <= 2.5 {
        return None;
    }
    let dir = direction_of(-stretch)?;
    let conf = 0.6 + ((stretch.abs() - 2.5) / 10.0).min(0.25);
    let stop = price - dir.sign() * atr;
    Some(Setup::at_levels(dir, conf, price, e20, stop))
}

/// Quiet, trendless market: position for the breakout in the EMA20/50 lean.
fn volatility_contraction(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let atr_pct = snap.atr_pct()?;
    let adx = snap.adx?.adx;
    if atr_pct >= 1.0 || adx >= 20.0 {
        return None;
    }
    let dir = direction_of(snap.ema20? - snap.ema50?)?;
    Some(Setup::at_atr_or_pct(dir, 0.5, price, snap.atr, (4.0, 1.5), (3.0, 1.0)))
}

/// Riding the band in a strong trend: continuation, not reversion.
fn bollinger_walk(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let bb = i.indicators.bollinger_bands?;
    let adx = i.indicators.adx?;
    if adx.adx <= 25.0 {
        return None;
    }
    let dir = if price >= bb.upper && adx.plus_di > adx.minus_di {
        Direction::Long
    } else if price <= bb.lower && adx.minus_di > adx.plus_di {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_levels(
        dir,
        0.6,
        price,
        price + dir.sign() * (bb.upper - bb.lower) * 0.5,
        bb.middle,
    ))
}
