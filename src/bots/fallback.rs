// =============================================================================
// Fallback bots - coin-ticker rules for assets without indicator history
// =============================================================================
//
// Low-confidence, deterministic rules over the 24h ticker. They exist so an
// asset with only a ticker still gets a vote; they never use randomness.

use super::{BotInputs, BotSpec, Setup};
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "ticker_trend", category: BotCategory::Fallback, run: ticker_trend },
    BotSpec { name: "ticker_mean_revert", category: BotCategory::Fallback, run: ticker_mean_revert },
    BotSpec { name: "ticker_range_edge", category: BotCategory::Fallback, run: ticker_range_edge },
    BotSpec { name: "ticker_momentum", category: BotCategory::Fallback, run: ticker_momentum },
];

/// Moderate 24h move with price on the same side of EMA20 (or SMA20).
fn ticker_trend(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let change = i.coin.change_24h_pct?;
    let avg = i.indicators.ema20.or(i.indicators.sma20)?;
    let dir = if change > 2.0 && price > avg {
        Direction::Long
    } else if change < -2.0 && price < avg {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_pct(dir, 0.5, price, 3.0, 1.5))
}

/// Outsized 24h move: bet on partial retracement.
fn ticker_mean_revert(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let change = i.coin.change_24h_pct?;
    let dir = if change > 8.0 {
        Direction::Short
    } else if change < -8.0 {
        Direction::Long
    } else {
        return None;
    };
    Some(Setup::at_pct(dir, 0.5, price, change.abs() / 3.0, change.abs() / 6.0))
}

/// Pressing against the 24h high or low: trade the break.
fn ticker_range_edge(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let high = i.coin.high_24h?;
    let low = i.coin.low_24h?;
    if !(low > 0.0 && high > low) {
        return None;
    }
    let range = high - low;
    if price >= high * 0.998 {
        Some(Setup::at_levels(Direction::Long, 0.5, price, price + range * 0.5, price - range * 0.25))
    } else if price <= low * 1.002 {
        Some(Setup::at_levels(Direction::Short, 0.5, price, price - range * 0.5, price + range * 0.25))
    } else {
        None
    }
}

/// 24h change and ROC agreeing.
fn ticker_momentum(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let change = i.coin.change_24h_pct?;
    let roc = i.indicators.roc?;
    if roc.abs() <= 1.0 || change * roc <= 0.0 {
        return None;
    }
    let dir = if roc > 0.0 { Direction::Long } else { Direction::Short };
    Some(Setup::at_pct(dir, 0.45, price, 2.5, 1.25))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::test_support::Fixture;

    #[test]
    fn ticker_trend_needs_average() {
        let mut fx = Fixture::priced(100.0);
        fx.coin.change_24h_pct = Some(4.0);
        assert!(ticker_trend(&fx.inputs()).is_none());
        fx.indicators.sma20 = Some(97.0);
        assert_eq!(ticker_trend(&fx.inputs()).unwrap().direction, Direction::Long);
    }

    #[test]
    fn big_dump_gets_bought() {
        let mut fx = Fixture::priced(100.0);
        fx.coin.change_24h_pct = Some(-12.0);
        let s = ticker_mean_revert(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert!((s.take_profit - 104.0).abs() < 1e-9);
        assert!((s.stop_loss - 98.0).abs() < 1e-9);
    }

    #[test]
    fn range_edges() {
        let mut fx = Fixture::priced(109.9);
        fx.coin.high_24h = Some(110.0);
        fx.coin.low_24h = Some(100.0);
        assert_eq!(ticker_range_edge(&fx.inputs()).unwrap().direction, Direction::Long);
        fx.indicators.price = Some(105.0);
        assert!(ticker_range_edge(&fx.inputs()).is_none());
    }

    #[test]
    fn momentum_requires_agreement() {
        let mut fx = Fixture::priced(100.0);
        fx.coin.change_24h_pct = Some(3.0);
        fx.indicators.roc = Some(-2.0);
        assert!(ticker_momentum(&fx.inputs()).is_none());
        fx.indicators.roc = Some(2.0);
        assert_eq!(ticker_momentum(&fx.inputs()).unwrap().direction, Direction::Long);
    }

    #[test]
    fn same_inputs_same_output() {
        let mut fx = Fixture::priced(100.0);
        fx.coin.change_24h_pct = Some(9.5);
        let a = ticker_mean_revert(&fx.inputs());
        let b = ticker_mean_revert(&fx.inputs());
        assert_eq!(a, b);
    }
}
