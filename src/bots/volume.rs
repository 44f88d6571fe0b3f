// =============================================================================
// Volume bots - VWAP, OBV, relative volume, accumulation / distribution
// =============================================================================

use super::{direction_of, BotInputs, BotSpec, Setup};
use crate::indicators::volume::relative_volume;
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "vwap_reversion", category: BotCategory::Volume, run: vwap_reversion },
    BotSpec { name: "vwap_trend", category: BotCategory::Volume, run: vwap_trend },
    BotSpec { name: "obv_trend", category: BotCategory::Volume, run: obv_trend },
    BotSpec { name: "volume_spike", category: BotCategory::Volume, run: volume_spike },
    BotSpec { name: "obv_divergence", category: BotCategory::Volume, run: obv_divergence },
    BotSpec { name: "accumulation", category: BotCategory::Volume, run: accumulation },
];

/// More than 3% from VWAP: fade back to it.
fn vwap_reversion(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let vwap = i.indicators.vwap.filter(|v| *v > 0.0)?;
    let dev = (price - vwap) / vwap;
    if dev.abs() <= 0.03 {
        return None;
    }
    let dir = direction_of(-dev)?;
    let conf = 0.55 + (dev.abs() * 3.0).min(0.3);
    let stop = price * (1.0 - dir.sign() * dev.abs() * 0.5);
    Some(Setup::at_levels(dir, conf, price, vwap, stop))
}

/// Within 3% of VWAP, on the side the EMA20/50 trend points.
fn vwap_trend(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let vwap = i.indicators.vwap.filter(|v| *v > 0.0)?;
    let trend = i.indicators.ema20? - i.indicators.ema50?;
    let dev = (price - vwap) / vwap;
    if dev.abs() > 0.03 || dev * trend <= 0.0 {
        return None;
    }
    let dir = direction_of(trend)?;
    Some(Setup::at_atr_or_pct(dir, 0.55, price, i.indicators.atr, (2.5, 1.25), (3.0, 1.5)))
}

/// OBV rising with price above EMA20, or falling with price below.
fn obv_trend(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let slope = i.indicators.obv_slope?;
    let e20 = i.indicators.ema20?;
    let dir = direction_of(slope)?;
    if (price - e20) * dir.sign() <= 0.0 {
        return None;
    }
    Some(Setup::at_atr_or_pct(dir, 0.55, price, i.indicators.atr, (2.5, 1.5), (3.0, 1.5)))
}

/// Last bar on at least twice the 20-bar average volume, traded in the
/// direction of its body.
fn volume_spike(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let rv = relative_volume(&i.indicators.candles, 20)?;
    if rv < 2.0 {
        return None;
    }
    let last = i.indicators.candles.last()?;
    let dir = direction_of(last.close - last.open)?;
    let conf = 0.55 + ((rv - 2.0) / 10.0).min(0.3);
    Some(Setup::at_atr_or_pct(dir, conf, price, i.indicators.atr, (2.0, 1.0), (2.5, 1.25)))
}

/// Price and OBV disagreeing over the last ten bars; trade with OBV.
fn obv_divergence(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let slope = i.indicators.obv_slope?;
    let window = i.indicators.last_candles(11)?;
    let first = window.first()?.close;
    if first <= 0.0 {
        return None;
    }
    let change = (window.last()?.close - first) / first * 100.0;
    let dir = if change < -2.0 && slope > 0.0 {
        Direction::Long
    } else if change > 2.0 && slope < 0.0 {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_atr_or_pct(dir, 0.6, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)))
}

/// Four of the last five bars closing in the top (or bottom) quarter of their
/// range on above-average volume.
fn accumulation(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let window = i.indicators.last_candles(25)?;
    let (base, recent) = window.split_at(20);
    let base_vol = base.iter().map(|c| c.volume).sum::<f64>() / base.len() as f64;
    let recent_vol = recent.iter().map(|c| c.volume).sum::<f64>() / recent.len() as f64;
    if base_vol <= 0.0 || recent_vol <= base_vol {
        return None;
    }
    let location = |c: &crate::market_data::Candle| {
        let range = c.high - c.low;
        (range > 0.0).then(|| (c.close - c.low) / range)
    };
    let locs: Vec<f64> = recent.iter().filter_map(location).collect();
    let strong = locs.iter().filter(|l| **l >= 0.75).count();
    let weak = locs.iter().filter(|l| **l <= 0.25).count();
    let dir = if strong >= 4 {
        Direction::Long
    } else if weak >= 4 {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_atr_or_pct(dir, 0.6, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)))
}
