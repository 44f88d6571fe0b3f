// =============================================================================
// Pattern bots - candlestick shapes, pivots, breakouts, market structure
// =============================================================================

use super::{direction_of, BotInputs, BotSpec, Setup};
use crate::indicators::structure::price_structure;
use crate::market_data::Candle;
use crate::types::{BotCategory, Direction};

pub const BOTS: &[BotSpec] = &[
    BotSpec { name: "engulfing", category: BotCategory::Pattern, run: engulfing },
    BotSpec { name: "hammer", category: BotCategory::Pattern, run: hammer },
    BotSpec { name: "three_soldiers", category: BotCategory::Pattern, run: three_soldiers },
    BotSpec { name: "double_bottom", category: BotCategory::Pattern, run: double_bottom },
    BotSpec { name: "doji_reversal", category: BotCategory::Pattern, run: doji_reversal },
    BotSpec { name: "inside_bar_breakout", category: BotCategory::Pattern, run: inside_bar_breakout },
    BotSpec { name: "pivot_points", category: BotCategory::Pattern, run: pivot_points },
    BotSpec { name: "donchian_breakout", category: BotCategory::Pattern, run: donchian_breakout },
    BotSpec { name: "market_structure", category: BotCategory::Pattern, run: market_structure },
];

fn body(c: &Candle) -> f64 {
    (c.close - c.open).abs()
}

fn range(c: &Candle) -> f64 {
    c.high - c.low
}

/// Stop beyond the signal candle's extreme; target at twice that risk.
fn candle_setup(dir: Direction, conf: f64, price: f64, signal: &Candle) -> Setup {
    let stop = match dir {
        Direction::Long => signal.low.min(price * 0.995),
        Direction::Short => signal.high.max(price * 1.005),
    };
    let risk = (price - stop).abs();
    Setup::at_levels(dir, conf, price, price + dir.sign() * risk * 2.0, stop)
}

fn engulfing(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let last = i.indicators.last_candles(2)?;
    let (prev, cur) = (&last[0], &last[1]);
    let dir = if prev.close < prev.open
        && cur.close > cur.open
        && cur.open <= prev.close
        && cur.close >= prev.open
    {
        Direction::Long
    } else if prev.close > prev.open
        && cur.close < cur.open
        && cur.open >= prev.close
        && cur.close <= prev.open
    {
        Direction::Short
    } else {
        return None;
    };
    Some(candle_setup(dir, 0.6, price, cur))
}

/// Hammer after a decline, shooting star after a rise.
fn hammer(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let window = i.indicators.last_candles(6)?;
    let c = window.last()?;
    let b = body(c);
    if b <= 0.0 {
        return None;
    }
    let upper_wick = c.high - c.open.max(c.close);
    let lower_wick = c.open.min(c.close) - c.low;
    let trend = c.close - window[0].close;

    let dir = if lower_wick >= 2.0 * b && upper_wick <= 0.3 * b && trend < 0.0 {
        Direction::Long
    } else if upper_wick >= 2.0 * b && lower_wick <= 0.3 * b && trend > 0.0 {
        Direction::Short
    } else {
        return None;
    };
    Some(candle_setup(dir, 0.6, price, c))
}

/// Three white soldiers / three black crows.
fn three_soldiers(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let last = i.indicators.last_candles(3)?;
    let solid = |c: &Candle| range(c) > 0.0 && body(c) > 0.5 * range(c);
    if !last.iter().all(solid) {
        return None;
    }
    let up = last.iter().all(|c| c.close > c.open) && last.windows(2).all(|w| w[1].close > w[0].close);
    let down = last.iter().all(|c| c.close < c.open) && last.windows(2).all(|w| w[1].close < w[0].close);
    let dir = match (up, down) {
        (true, false) => Direction::Long,
        (false, true) => Direction::Short,
        _ => return None,
    };
    Some(candle_setup(dir, 0.62, price, &last[0]))
}

const DOUBLE_WINDOW: usize = 30;

/// Two matching lows (highs) in the two halves of a 30-bar window with a
/// meaningful bounce in between; fires once price is back above the midpoint.
fn double_bottom(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let window = i.indicators.last_candles(DOUBLE_WINDOW)?;
    let (left, right) = window.split_at(DOUBLE_WINDOW / 2);

    let argmin = |cs: &[Candle]| {
        cs.iter()
            .enumerate()
            .min_by(|a, b| a.1.low.total_cmp(&b.1.low))
            .map(|(k, c)| (k, c.low))
    };
    let argmax = |cs: &[Candle]| {
        cs.iter()
            .enumerate()
            .max_by(|a, b| a.1.high.total_cmp(&b.1.high))
            .map(|(k, c)| (k, c.high))
    };

    // Bottoms
    let (li, low_a) = argmin(left)?;
    let (ri, low_b) = argmin(right)?;
    let ri = ri + left.len();
    if low_a > 0.0 && ri - li >= 5 && ((low_a - low_b) / low_a).abs() <= 0.01 {
        let peak = window[li..=ri].iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let floor = low_a.min(low_b);
        if (peak - floor) / floor >= 0.03 && price > (peak + floor) / 2.0 && price > floor {
            return Some(Setup::at_levels(Direction::Long, 0.6, price, price + (peak - floor), floor));
        }
    }

    // Tops
    let (li, high_a) = argmax(left)?;
    let (ri, high_b) = argmax(right)?;
    let ri = ri + left.len();
    if high_a > 0.0 && ri - li >= 5 && ((high_a - high_b) / high_a).abs() <= 0.01 {
        let trough = window[li..=ri].iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let ceiling = high_a.max(high_b);
        if (ceiling - trough) / ceiling >= 0.03 && price < (ceiling + trough) / 2.0 && price < ceiling {
            return Some(Setup::at_levels(Direction::Short, 0.6, price, price - (ceiling - trough), ceiling));
        }
    }
    None
}

/// Doji printed outside a Bollinger band.
fn doji_reversal(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let bb = i.indicators.bollinger_bands?;
    let c = i.indicators.candles.last()?;
    let r = range(c);
    if r <= 0.0 || body(c) >= 0.1 * r {
        return None;
    }
    let dir = if c.low <= bb.lower {
        Direction::Long
    } else if c.high >= bb.upper {
        Direction::Short
    } else {
        return None;
    };
    let stop = match dir {
        Direction::Long => c.low.min(price * 0.99),
        Direction::Short => c.high.max(price * 1.01),
    };
    Some(Setup::at_levels(dir, 0.55, price, bb.middle, stop))
}

/// Close through the range of an inside bar.
fn inside_bar_breakout(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let last = i.indicators.last_candles(3)?;
    let (mother, inside, cur) = (&last[0], &last[1], &last[2]);
    if !(inside.high < mother.high && inside.low > mother.low) {
        return None;
    }
    let (dir, stop) = if cur.close > inside.high {
        (Direction::Long, inside.low)
    } else if cur.close < inside.low {
        (Direction::Short, inside.high)
    } else {
        return None;
    };
    let risk = (price - stop).abs();
    Some(Setup::at_levels(dir, 0.55, price, price + dir.sign() * risk * 2.0, stop))
}

/// Classic floor pivots from the prior bar; buy near S1, sell near R1.
fn pivot_points(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let last = i.indicators.last_candles(2)?;
    let prev = &last[0];
    let pivot = (prev.high + prev.low + prev.close) / 3.0;
    let s1 = 2.0 * pivot - prev.high;
    let r1 = 2.0 * pivot - prev.low;
    let s2 = pivot - range(prev);
    let r2 = pivot + range(prev);
    let near = |level: f64| level > 0.0 && ((price - level) / level).abs() <= 0.003;

    if near(s1) && price < pivot && s2 > 0.0 && s2 < price {
        Some(Setup::at_levels(Direction::Long, 0.55, price, pivot, s2))
    } else if near(r1) && price > pivot && r2 > price {
        Some(Setup::at_levels(Direction::Short, 0.55, price, pivot, r2))
    } else {
        None
    }
}

/// 20-bar channel breakout.
fn donchian_breakout(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let window = i.indicators.last_candles(21)?;
    let (channel, cur) = window.split_at(20);
    let cur = cur.first()?;
    let hi = channel.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let lo = channel.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let mid = (hi + lo) / 2.0;
    let dir = if cur.close > hi {
        Direction::Long
    } else if cur.close < lo {
        Direction::Short
    } else {
        return None;
    };
    let target = price + dir.sign() * (hi - lo);
    Some(Setup::at_levels(dir, 0.6, price, target, mid))
}

/// Persistent higher-highs/higher-lows (or the mirror).
fn market_structure(i: &BotInputs<'_>) -> Option<Setup> {
    let price = i.price()?;
    let counts = price_structure(&i.indicators.candles, 10)?;
    let bias = counts.bias();
    if bias.abs() <= 0.6 {
        return None;
    }
    let dir = direction_of(bias)?;
    let conf = 0.5 + bias.abs() * 0.3;
    Some(Setup::at_atr_or_pct(dir, conf, price, i.indicators.atr, (3.0, 1.5), (4.0, 2.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::test_support::{candle, Fixture};
    use crate::indicators::bollinger::BollingerBands;

    fn with_candles(candles: Vec<Candle>) -> Fixture {
        let mut fx = Fixture::default();
        fx.indicators.candles = candles;
        fx
    }

    #[test]
    fn bullish_engulfing() {
        let fx = with_candles(vec![
            candle(101.0, 101.5, 99.5, 100.0, 1.0),
            candle(99.8, 102.0, 99.6, 101.5, 1.0),
        ]);
        let s = engulfing(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert!(s.stop_loss < s.entry && s.take_profit > s.entry);
    }

    #[test]
    fn hammer_after_decline() {
        let mut candles: Vec<_> = (0..5)
            .map(|i| {
                let c = 105.0 - i as f64;
                candle(c + 0.5, c + 0.7, c - 0.2, c, 1.0)
            })
            .collect();
        candles.push(candle(100.0, 100.6, 97.0, 100.5, 1.0));
        let s = hammer(&with_candles(candles).inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.stop_loss, 97.0);
    }

    #[test]
    fn three_black_crows() {
        let fx = with_candles(vec![
            candle(110.0, 110.2, 107.8, 108.0, 1.0),
            candle(108.0, 108.1, 105.9, 106.0, 1.0),
            candle(106.0, 106.2, 103.8, 104.0, 1.0),
        ]);
        assert_eq!(three_soldiers(&fx.inputs()).unwrap().direction, Direction::Short);
    }

    #[test]
    fn double_bottom_breakout() {
        let mut candles = Vec::new();
        for k in 0..15 {
            let low = if k == 4 { 90.0 } else { 95.0 };
            candles.push(candle(96.0, 97.0, low, 96.0, 1.0));
        }
        for k in 0..15 {
            let (low, high) = match k {
                0 => (96.0, 100.0),
                6 => (90.3, 95.0),
                _ => (95.0, 97.0),
            };
            candles.push(candle(96.0, high, low, 96.0, 1.0));
        }
        let s = double_bottom(&with_candles(candles).inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.stop_loss, 90.0);
    }

    #[test]
    fn doji_at_upper_band() {
        let mut fx = with_candles(vec![candle(110.0, 111.5, 108.5, 110.1, 1.0)]);
        fx.indicators.bollinger_bands = Some(BollingerBands { upper: 111.0, middle: 100.0, lower: 89.0 });
        let s = doji_reversal(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Short);
        assert_eq!(s.take_profit, 100.0);
    }

    #[test]
    fn inside_bar_break_down() {
        let fx = with_candles(vec![
            candle(100.0, 105.0, 95.0, 101.0, 1.0),
            candle(101.0, 103.0, 98.0, 100.0, 1.0),
            candle(100.0, 100.5, 96.0, 97.0, 1.0),
        ]);
        let s = inside_bar_breakout(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Short);
        assert_eq!(s.stop_loss, 103.0);
    }

    #[test]
    fn pivot_support_bounce() {
        // Prior bar H=110 L=90 C=100 -> P=100, S1=90, S2=80.
        let mut fx = with_candles(vec![
            candle(100.0, 110.0, 90.0, 100.0, 1.0),
            candle(95.0, 96.0, 89.5, 90.1, 1.0),
        ]);
        fx.indicators.price = Some(90.1);
        let s = pivot_points(&fx.inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.take_profit, 100.0);
        assert_eq!(s.stop_loss, 80.0);
    }

    #[test]
    fn donchian_upside_break() {
        let mut candles: Vec<_> = (0..20).map(|_| candle(100.0, 102.0, 98.0, 100.0, 1.0)).collect();
        candles.push(candle(101.0, 103.5, 100.5, 103.0, 1.0));
        let s = donchian_breakout(&with_candles(candles).inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.stop_loss, 100.0);
        assert_eq!(s.take_profit, 107.0);
    }

    #[test]
    fn structure_uptrend() {
        let candles: Vec<_> = (0..12)
            .map(|i| {
                let b = 100.0 + i as f64;
                candle(b, b + 1.0, b - 1.0, b + 0.5, 1.0)
            })
            .collect();
        let s = market_structure(&with_candles(candles).inputs()).unwrap();
        assert_eq!(s.direction, Direction::Long);
        assert!((s.confidence - 0.8).abs() < 1e-9);
    }
}
