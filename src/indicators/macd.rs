// =============================================================================
// MACD - Moving Average Convergence / Divergence
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal_period) of the macd line
//   histogram = macd - signal

use serde::{Deserialize, Serialize};

use crate::indicators::ema::calculate_ema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Latest MACD reading with the classic 12 / 26 / 9 parameters.
pub fn standard_macd(closes: &[f64]) -> Option<MacdReading> {
    calculate_macd(closes, 12, 26, 9)
}

/// Latest MACD reading. Needs `slow + signal - 1` closes.
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Option<MacdReading> {
    if fast == 0 || fast >= slow || signal_period == 0 {
        return None;
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if slow_ema.is_empty() {
        return None;
    }

    // Both series end on the last close; align on the slow series.
    let offset = fast_ema.len().checked_sub(slow_ema.len())?;
    let line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, s)| fast_ema[i + offset] - s)
        .collect();

    let signal_line = calculate_ema(&line, signal_period);
    let value = *line.last()?;
    let signal = *signal_line.last()?;

    Some(MacdReading {
        value,
        signal,
        histogram: value - signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_needs_history() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        assert!(standard_macd(&closes).is_none());
        assert!(calculate_macd(&closes, 26, 12, 9).is_none());
    }

    #[test]
    fn macd_rising_series_is_positive() {
        let closes: Vec<f64> = (1..=80).map(|x| 100.0 + x as f64 * 1.5).collect();
        let m = standard_macd(&closes).unwrap();
        assert!(m.value > 0.0);
        assert!((m.histogram - (m.value - m.signal)).abs() < 1e-12);
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let m = standard_macd(&[100.0; 60]).unwrap();
        assert!(m.value.abs() < 1e-10);
        assert!(m.histogram.abs() < 1e-10);
    }
}
