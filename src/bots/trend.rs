// =============================================================================
// Trend bots - moving-average structure, ADX, MACD, Ichimoku, SAR
// =============================================================================

use super::{direction_of, BotInputs, BotSpec, Setup};
use crate::indicators::ema::stack_alignment;
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "ema_cross", category: BotCategory::Trend, run: ema_cross },
    BotSpec { name: "golden_cross", category: BotCategory::Trend, run: golden_cross },
    BotSpec { name: "ema_ribbon", category: BotCategory::Trend, run: ema_ribbon },
    BotSpec { name: "adx_trend", category: BotCategory::Trend, run: adx_trend },
    BotSpec { name: "macd_cross", category: BotCategory::Trend, run: macd_cross },
    BotSpec { name: "macd_zero_line", category: BotCategory::Trend, run: macd_zero_line },
    BotSpec { name: "ichimoku_cloud", category: BotCategory::Trend, run: ichimoku_cloud },
    BotSpec { name: "parabolic_sar", category: BotCategory::Trend, run: parabolic_sar },
    BotSpec { name: "trend_ride", category: BotCategory::Trend, run: trend_ride },
    BotSpec { name: "sma_cross", category: BotCategory::Trend, run: sma_cross },
];

/// EMA20 vs EMA50 separation with price on the same side of EMA20.
fn ema_cross(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let (e20, e50) = (snap.ema20?, snap.ema50?);
    if e50 <= 0.0 {
        return None;
    }
    let gap = (e20 - e50) / e50;
    if gap.abs() < 0.002 {
        return None;
    }
    let dir = direction_of(gap)?;
    if (price - e20) * dir.sign() <= 0.0 {
        return None;
    }
    let conf = 0.55 + (gap.abs() * 20.0).min(0.3);
    Some(Setup::at_atr_or_pct(dir, conf, price, snap.atr, (3.0, 1.5), (4.0, 2.0)))
}

/// EMA50 vs EMA200: the slow regime cross.
fn golden_cross(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let (e50, e200) = (snap.ema50?, snap.ema200?);
    if e200 <= 0.0 {
        return None;
    }
    let gap = (e50 - e200) / e200;
    if gap.abs() < 0.005 {
        return None;
    }
    let dir = direction_of(gap)?;
    let conf = 0.6 + (gap.abs() * 10.0).min(0.25);
    Some(Setup::at_pct(dir, conf, price, 6.0, 3.0))
}

/// Fully stacked EMA9/21/50 with price leading the stack. Stop at EMA50.
fn ema_ribbon(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let (e9, e21, e50) = (snap.ema9?, snap.ema21?, snap.ema50?);
    let (bullish, strength) = stack_alignment(e9, e21, e50)?;
    let dir = if bullish { Direction::Long } else { Direction::Short };
    if (price - e9) * dir.sign() <= 0.0 {
        return None;
    }
    let conf = 0.6 + (strength * 10.0).min(0.3);
    let target = price * (1.0 + dir.sign() * 0.05);
    Some(Setup::at_levels(dir, conf, price, target, e50))
}

/// Strong ADX with a clear DI spread.
fn adx_trend(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let adx = snap.adx?;
    if adx.adx < 25.0 {
        return None;
    }
    let spread = adx.plus_di - adx.minus_di;
    if spread.abs() < 5.0 {
        return None;
    }
    let dir = direction_of(spread)?;
    let conf = 0.5 + ((adx.adx - 25.0) / 50.0).min(0.4);
    Some(Setup::at_atr_or_pct(dir, conf, price, snap.atr, (3.0, 1.5), (4.0, 2.0)))
}

/// Early MACD cross: histogram has flipped while the line is still on the
/// other side of zero.
fn macd_cross(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let macd = i.indicators.macd?;
    if macd.histogram == 0.0 || macd.value == 0.0 || macd.histogram.signum() == macd.value.signum() {
        return None;
    }
    let dir = direction_of(macd.histogram)?;
    let conf = 0.55 + (macd.histogram.abs() / price * 2000.0).min(0.25);
    Some(Setup::at_atr_or_pct(dir, conf, price, i.indicators.atr, (2.5, 1.5), (3.0, 1.5)))
}

/// MACD line, signal and histogram all on the same side of zero.
fn macd_zero_line(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let macd = i.indicators.macd?;
    let dir = direction_of(macd.value)?;
    let s = dir.sign();
    if macd.signal * s <= 0.0 || macd.histogram * s <= 0.0 {
        return None;
    }
    let conf = 0.6 + (macd.value.abs() / price * 500.0).min(0.2);
    Some(Setup::at_atr_or_pct(dir, conf, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)))
}

/// Price outside the cloud with tenkan/kijun agreeing. Stop at the kijun when
/// it is on the protective side.
fn ichimoku_cloud(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let ichi = i.indicators.ichimoku?;
    let dir = if price > ichi.cloud_top() && ichi.tenkan > ichi.kijun {
        Direction::Long
    } else if price < ichi.cloud_bottom() && ichi.tenkan < ichi.kijun {
        Direction::Short
    } else {
        return None;
    };
    let edge = match dir {
        Direction::Long => ichi.cloud_top(),
        Direction::Short => ichi.cloud_bottom(),
    };
    let conf = 0.6 + ((price - edge).abs() / price * 10.0).min(0.25);
    let s = dir.sign();
    if (price - ichi.kijun) * s > 0.0 {
        let target = price + (price - ichi.kijun) * 2.0;
        Some(Setup::at_levels(dir, conf, price, target, ichi.kijun))
    } else {
        Some(Setup::at_pct(dir, conf, price, 5.0, 2.5))
    }
}

/// Follow the SAR; the SAR is the stop.
fn parabolic_sar(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let sar = i.indicators.parabolic_sar?;
    let dir = sar.trend;
    let risk = (price - sar.value) * dir.sign();
    if risk <= 0.0 {
        return None;
    }
    let trending = i.indicators.adx.map_or(false, |a| a.adx > 25.0);
    let conf = if trending { 0.65 } else { 0.55 };
    Some(Setup::at_levels(dir, conf, price, price + dir.sign() * risk * 2.0, sar.value))
}

/// Price, EMA50 and EMA200 stacked, scored by ATR-distance from EMA200.
fn trend_ride(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let (e50, e200, atr) = (snap.ema50?, snap.ema200?, snap.atr?);
    if atr <= 0.0 {
        return None;
    }
    let dir = if price > e50 && e50 > e200 {
        Direction::Long
    } else if price < e50 && e50 < e200 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.55 + ((price - e200).abs() / atr / 20.0).min(0.3);
    Some(Setup::at_atr(dir, conf, price, atr, 3.0, 2.0))
}

fn sma_cross(i: &BotInputs<'_>) -> Option<Setup> {
    let snap = i.indicators;
    let price = i.price()?;
    let (s20, s50) = (snap.sma20?, snap.sma50?);
    if s50 <= 0.0 {
        return None;
    }
    let gap = (s20 - s50) / s50;
    if gap.abs() < 0.003 {
        return None;
    }
    let dir = direction_of(gap)?;
    let conf = 0.55 + (gap.abs() * 15.0).min(0.25);
    Some(Setup::at_pct(dir, conf, price, 4.0, 2.0))
}
