// =============================================================================
// Options bots - put/call skew, IV regime, unusual and institutional flow
// =============================================================================
//
// Only assets with an options snapshot reach these; everything else abstains.

use super::{BotInputs, BotSpec, Setup};
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "put_call_contrarian", category: BotCategory::Options, run: put_call_contrarian },
    BotSpec { name: "iv_extreme", category: BotCategory::Options, run: iv_extreme },
    BotSpec { name: "unusual_activity", category: BotCategory::Options, run: unusual_activity },
    BotSpec { name: "institutional_flow", category: BotCategory::Options, run: institutional_flow },
];

/// Heavy put buying marks fear (buy); heavy call buying marks greed (sell).
fn put_call_contrarian(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let pcr = i.options?.put_call_ratio.filter(|r| r.is_finite() && *r > 0.0)?;
    let dir = if pcr > 1.2 {
        Direction::Long
    } else if pcr < 0.5 {
        Direction::Short
    } else {
        return None;
    };
    let conf = 0.55 + ((pcr - 0.85).abs() / 3.0).min(0.3);
    Some(Setup::at_pct(dir, conf, price, 4.0, 2.0))
}

/// IV at the top of its range under a falling price is capitulation; IV at
/// the bottom with price stretched above EMA20 is complacency.
fn iv_extreme(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let ivp = i.options?.iv_percentile?;
    let e20 = i.indicators.ema20?;
    let dir = if ivp > 90.0 && price < e20 {
        Direction::Long
    } else if ivp < 10.0 && price > e20 {
        Direction::Short
    } else {
        return None;
    };
    Some(Setup::at_pct(dir, 0.55, price, 5.0, 2.5))
}

fn unusual_activity(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let opts = i.options?;
    let dir = match (opts.unusual_call_activity, opts.unusual_put_activity) {
        (true, false) => Direction::Long,
        (false, true) => Direction::Short,
        _ => return None,
    };
    Some(Setup::at_pct(dir, 0.6, price, 4.0, 2.0))
}

/// Follow block-sized flow; a put/call ratio leaning the same way adds
/// conviction.
fn institutional_flow(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let opts = i.options?;
    let dir = opts.institutional_flow?;
    let confirmed = match (dir, opts.put_call_ratio) {
        (Direction::Long, Some(pcr)) => pcr < 0.85,
        (Direction::Short, Some(pcr)) => pcr > 0.85,
        _ => false,
    };
    let conf = if confirmed { 0.75 } else { 0.65 };
    Some(Setup::at_pct(dir, conf, price, 5.0, 2.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::test_support::Fixture;
    use crate::market_data::OptionsSnapshot;

    fn with_options(opts: OptionsSnapshot) -> Fixture {
        let mut fx = Fixture::priced(100.0);
        fx.options = Some(opts);
        fx
    }

    #[test]
    fn no_options_means_abstain() {
        let mut fx = Fixture::priced(100.0);
        fx.indicators.ema20 = Some(90.0);
        for bot in BOTS {
            assert!((bot.run)(&fx.inputs()).is_none(), "{} fired", bot.name);
        }
    }

    #[test]
    fn fearful_put_call_is_bullish() {
        let fx = with_options(OptionsSnapshot {
            put_call_ratio: Some(1.45),
            ..OptionsSnapshot::default()
        });
        let s = put_call_contrarian(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert!((s.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn iv_capitulation() {
        let mut fx = with_options(OptionsSnapshot {
            iv_percentile: Some(95.0),
            ..OptionsSnapshot::default()
        });
        fx.indicators.ema20 = Some(105.0);
        assert_eq!(iv_extreme(&fx.inputs()).unwrap().direction, Direction::Long);
    }

    #[test]
    fn mixed_unusual_activity_abstains() {
        let fx = with_options(OptionsSnapshot {
            unusual_call_activity: true,
            unusual_put_activity: true,
            ..OptionsSnapshot::default()
        });
        assert!(unusual_activity(&fx.inputs()).is_none());
    }

    #[test]
    fn institutional_flow_confirmation() {
        let fx = with_options(OptionsSnapshot {
            institutional_flow: Some(Direction::Short),
            put_call_ratio: Some(1.1),
            ..OptionsSnapshot::default()
        });
        let s = institutional_flow(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Short);
        assert_eq!(s.confidence, 0.75);
    }
}
