// =============================================================================
// Relative Strength Index (RSI) - Wilder's Smoothing
// =============================================================================
//
//   avg_gain = (prev_avg_gain * (period - 1) + gain) / period
//   avg_loss = (prev_avg_loss * (period - 1) + loss) / period
//   RSI      = 100 - 100 / (1 + avg_gain / avg_loss)
//
// Both averages are seeded with the SMA of the first `period` deltas.
// =============================================================================

/// Oversold / overbought boundaries shared by the oscillator bots.
pub const OVERSOLD: f64 = 30.0;
pub const OVERBOUGHT: f64 = 70.0;

/// Compute the full RSI series for `closes`.
///
/// One value per close starting at index `period`. Empty when
/// `period == 0` or there are fewer than `period + 1` closes. A flat market
/// reads 50, a market with no down moves reads 100.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let split = |d: f64| if d > 0.0 { (d, 0.0) } else { (0.0, -d) };
    let deltas: Vec<(f64, f64)> = closes.windows(2).map(|w| split(w[1] - w[0])).collect();

    let period_f = period as f64;
    let (seed_gain, seed_loss) = deltas[..period]
        .iter()
        .fold((0.0, 0.0), |(g, l), &(dg, dl)| (g + dg, l + dl));
    let mut avg_gain = seed_gain / period_f;
    let mut avg_loss = seed_loss / period_f;

    let mut result = Vec::with_capacity(deltas.len() - period + 1);
    match rsi_from_averages(avg_gain, avg_loss) {
        Some(v) => result.push(v),
        None => return result,
    }

    for &(gain, loss) in &deltas[period..] {
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        match rsi_from_averages(avg_gain, avg_loss) {
            Some(v) => result.push(v),
            None => break,
        }
    }

    result
}

/// Most recent RSI value.
pub fn current_rsi(closes: &[f64], period: usize) -> Option<f64> {
    calculate_rsi(closes, period).last().copied()
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    };
    rsi.is_finite().then_some(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_insufficient_data() {
        assert!(calculate_rsi(&[], 14).is_empty());
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).is_empty());
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(calculate_rsi(&closes, 14).is_empty());
    }

    #[test]
    fn rsi_extremes() {
        let up: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert!((current_rsi(&up, 14).unwrap() - 100.0).abs() < 1e-10);

        let down: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        assert!(current_rsi(&down, 14).unwrap().abs() < 1e-10);

        assert!((current_rsi(&[100.0; 30], 14).unwrap() - 50.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series.len(), closes.len() - 14);
        for &v in &series {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
