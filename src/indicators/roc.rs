// =============================================================================
// Rate of Change (ROC)
// =============================================================================
//
//   ROC = (close - close_n) / close_n * 100

/// Most recent ROC over `period` bars. `None` with too little data or a zero
/// reference close.
pub fn current_roc(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() <= period {
        return None;
    }
    let last = *closes.last()?;
    let reference = closes[closes.len() - 1 - period];
    if reference == 0.0 {
        return None;
    }
    let roc = (last - reference) / reference * 100.0;
    roc.is_finite().then_some(roc)
}
