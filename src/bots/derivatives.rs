// =============================================================================
// Derivatives bots - funding, positioning, open interest, on-chain flow
// =============================================================================
//
// These run on the perpetual-futures bundle and suggest leverage alongside
// the levels.

use super::{direction_of, BotInputs, BotSpec, Setup};
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "funding_contrarian", category: BotCategory::Derivatives, run: funding_contrarian },
    BotSpec { name: "long_short_contrarian", category: BotCategory::Derivatives, run: long_short_contrarian },
    BotSpec { name: "open_interest_trend", category: BotCategory::Derivatives, run: open_interest_trend },
    BotSpec { name: "squeeze_hunter", category: BotCategory::Derivatives, run: squeeze_hunter },
    BotSpec { name: "exchange_netflow", category: BotCategory::Derivatives, run: exchange_netflow },
    BotSpec { name: "whale_activity", category: BotCategory::Derivatives, run: whale_activity },
];

/// Fade extreme funding.
fn funding_contrarian(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let funding = i.derivatives.funding()?;
    if !funding.is_extreme() {
        return None;
    }
    let dir = direction_of(funding.signal)?;
    let conf = 0.55 + funding.signal.abs() * 0.3;
    Some(Setup::at_pct(dir, conf, price, 4.0, 2.0).with_leverage(3))
}

/// Fade a crowded long/short ratio.
fn long_short_contrarian(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let ls = i.derivatives.long_short()?;
    if ls.signal.abs() < 0.5 {
        return None;
    }
    let dir = direction_of(ls.signal)?;
    let conf = 0.5 + ls.signal.abs() * 0.3;
    Some(Setup::at_pct(dir, conf, price, 3.5, 1.75).with_leverage(2))
}

/// Strong OI quadrant (new money behind the move). Stands aside during a
/// liquidation cascade.
fn open_interest_trend(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let oi = i.derivatives.open_interest(i.recent_change_pct())?;
    if oi.liquidation_cascade || oi.signal.abs() < 0.6 {
        return None;
    }
    let dir = direction_of(oi.signal)?;
    Some(Setup::at_atr_or_pct(dir, 0.6, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)).with_leverage(3))
}

/// Rising OI into one-sided funding while price moves against the payers.
fn squeeze_hunter(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let rate_pct = i.derivatives.funding_rate? * 100.0;
    let oi_change = i.derivatives.open_interest_change_pct?;
    let price_change = i.recent_change_pct()?;
    if oi_change <= 5.0 {
        return None;
    }
    let dir = if rate_pct < -0.03 && price_change > 0.0 {
        Direction::Long
    } else if rate_pct > 0.05 && price_change < 0.0 {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_pct(dir, 0.7, price, 6.0, 2.5).with_leverage(5))
}

/// Coins leaving exchanges is accumulation; arriving is supply. Scaled by
/// 24h volume, so abstains without it.
fn exchange_netflow(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let netflow = i.derivatives.exchange_netflow?;
    let volume = i.coin.volume_24h.filter(|v| *v > 0.0)?;
    let ratio = netflow / volume;
    if ratio.abs() < 0.02 {
        return None;
    }
    let dir = direction_of(-ratio)?;
    let conf = 0.55 + (ratio.abs() * 5.0).min(0.3);
    Some(Setup::at_pct(dir, conf, price, 5.0, 2.5).with_leverage(2))
}

/// Top-address share of exchange inflow: heavy whale deposits precede selling.
fn whale_activity(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let whale = i.derivatives.whale_ratio.filter(|w| (0.0..=1.0).contains(w))?;
    let (dir, conf) = if whale > 0.85 {
        (Direction::Short, 0.6)
    } else if whale < 0.35 {
        (Direction::Long, 0.5)
    } else {
        return None;
    };
    Some(Setup::at_pct(dir, conf, price, 4.0, 2.0).with_leverage(2))
}
