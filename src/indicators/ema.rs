// =============================================================================
// Moving Averages - EMA and SMA
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period` closes.
// =============================================================================

/// Compute the EMA series for the given `closes` slice and look-back `period`.
///
/// Returns an empty `Vec` when the input is too short or the period is zero.
/// Each output element corresponds to a close starting at index `period - 1`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `closes.len() < period` => empty vec
/// - A non-finite intermediate value truncates the series.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    // Seed: SMA of the first `period` values.
    let sma: f64 = closes[..period].iter().sum::<f64>() / period as f64;
    if !sma.is_finite() {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(closes.len() - period + 1);
    result.push(sma);

    let mut prev_ema = sma;
    for &close in &closes[period..] {
        let ema = close * multiplier + prev_ema * (1.0 - multiplier);
        if !ema.is_finite() {
            break;
        }
        result.push(ema);
        prev_ema = ema;
    }

    result
}

/// Most recent EMA value, if the series could be computed.
pub fn current_ema(closes: &[f64], period: usize) -> Option<f64> {
    calculate_ema(closes, period).last().copied()
}

/// Simple moving average of the last `period` closes.
pub fn calculate_sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let sma = window.iter().sum::<f64>() / period as f64;
    sma.is_finite().then_some(sma)
}

/// Check whether a fast / mid / slow moving-average stack is trend-aligned.
///
/// Returns `Some((is_bullish, strength))` where:
/// - `is_bullish == true`  when fast > mid > slow
/// - `is_bullish == false` when fast < mid < slow
/// - `strength = |fast - slow| / slow`
///
/// Returns `None` when the stack is mixed, `slow` is zero, or the strength is
/// non-finite.
pub fn stack_alignment(fast: f64, mid: f64, slow: f64) -> Option<(bool, f64)> {
    let bullish = fast > mid && mid > slow;
    let bearish = fast < mid && mid < slow;

    if !bullish && !bearish {
        return None;
    }
    if slow == 0.0 {
        return None;
    }

    let strength = (fast - slow).abs() / slow;
    if !strength.is_finite() {
        return None;
    }

    Some((bullish, strength))
}
