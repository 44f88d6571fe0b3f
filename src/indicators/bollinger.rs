// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Middle band = SMA, upper/lower = SMA ± k·σ (population σ).
// Band width (BBW) = (upper - lower) / middle * 100.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Band width as a percentage of the middle band.
    pub fn width_pct(&self) -> Option<f64> {
        if self.middle == 0.0 {
            return None;
        }
        let width = (self.upper - self.lower) / self.middle * 100.0;
        width.is_finite().then_some(width)
    }

    /// Position of `price` inside the bands: 0 at the lower band, 1 at the
    /// upper band. Outside the bands the value leaves [0, 1].
    pub fn percent_b(&self, price: f64) -> Option<f64> {
        let span = self.upper - self.lower;
        if span <= 0.0 {
            return None;
        }
        Some((price - self.lower) / span)
    }
}

/// Calculate Bollinger Bands over the last `period` closes.
///
/// Returns `None` with fewer than `period` closes or a zero middle band.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerBands> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    if middle == 0.0 || !middle.is_finite() {
        return None;
    }

    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let bands = BollingerBands {
        upper: middle + num_std * std_dev,
        middle,
        lower: middle - num_std * std_dev,
    };
    bands.width_pct().map(|_| bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert!(bb.upper > bb.middle && bb.lower < bb.middle);
        assert!(bb.width_pct().unwrap() > 0.0);
    }

    #[test]
    fn bollinger_insufficient_data() {
        assert!(calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0).is_none());
    }

    #[test]
    fn bollinger_flat_has_zero_width() {
        let bb = calculate_bollinger(&[100.0; 20], 20, 2.0).unwrap();
        assert!(bb.width_pct().unwrap().abs() < 1e-10);
        assert!(bb.percent_b(100.0).is_none());
    }

    #[test]
    fn percent_b_positions() {
        let bb = BollingerBands {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
        };
        assert!((bb.percent_b(90.0).unwrap()).abs() < 1e-10);
        assert!((bb.percent_b(100.0).unwrap() - 0.5).abs() < 1e-10);
        assert!(bb.percent_b(115.0).unwrap() > 1.0);
    }
}
