// Regression analysis - Least-squares fit between two variables
use crate::domain::record::Reading;
use crate::domain::regression::{FitLine, RegressionResult};
use thiserror::Error;

pub const FIT_LINE_POINTS: usize = 100;

#[derive(Debug, Error, PartialEq)]
pub enum RegressionError {
    #[error("need at least 2 complete pairs, found {pairs}")]
    InsufficientData { pairs: usize },
    #[error("predictor has zero variance across {pairs} pairs")]
    DegeneratePredictor { pairs: usize },
}

/// Pairs at positions where both readings are present.
pub fn complete_pairs(x: &[Reading], y: &[Reading]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect()
}

/// Ordinary least squares of `y` on `x` over the pairwise-complete positions.
///
/// Uses the two-pass form (means first, then centered sums) so the result is
/// bit-stable for identical input. `r_squared` is the squared Pearson
/// coefficient; a constant response with a varying predictor fits exactly and
/// reports 1.0.
pub fn fit(pairs: &[(f64, f64)]) -> Result<RegressionResult, RegressionError> {
    let count = pairs.len();
    if count < 2 {
        return Err(RegressionError::InsufficientData { pairs: count });
    }

    let n = count as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0f64;
    let mut syy = 0.0f64;
    let mut sxy = 0.0f64;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if !sxx.is_finite() || sxx == 0.0 {
        return Err(RegressionError::DegeneratePredictor { pairs: count });
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy == 0.0 {
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    Ok(RegressionResult {
        slope,
        intercept,
        r_squared,
        sample_count: count,
    })
}

/// `FIT_LINE_POINTS` evenly spaced x values over `[min_x, max_x]`, endpoints exact.
pub fn fit_line(result: &RegressionResult, pairs: &[(f64, f64)]) -> FitLine {
    let min_x = pairs.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = pairs.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);

    let last = FIT_LINE_POINTS - 1;
    let step = (max_x - min_x) / last as f64;
    let x: Vec<f64> = (0..FIT_LINE_POINTS)
        .map(|i| if i == last { max_x } else { min_x + step * i as f64 })
        .collect();
    let y = x.iter().map(|x| result.predict(*x)).collect();

    FitLine { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_linear_fit() {
        let pairs = complete_pairs(
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            &[Some(2.0), Some(4.0), Some(6.0), Some(8.0)],
        );
        let result = fit(&pairs).unwrap();
        assert_eq!(result.slope, 2.0);
        assert_eq!(result.intercept, 0.0);
        assert_eq!(result.r_squared, 1.0);
        assert_eq!(result.sample_count, 4);
    }

    #[test]
    fn test_pairwise_complete_positions_only() {
        let x = [Some(1.0), None, Some(3.0), Some(4.0), Some(100.0)];
        let y = [Some(1.0), Some(50.0), None, Some(4.0), None];
        let pairs = complete_pairs(&x, &y);
        assert_eq!(pairs, vec![(1.0, 1.0), (4.0, 4.0)]);

        let result = fit(&pairs).unwrap();
        assert_eq!(result.sample_count, 2);
        assert_eq!(result.slope, 1.0);
        assert_eq!(result.intercept, 0.0);
    }

    #[test]
    fn test_fewer_than_two_pairs_is_insufficient() {
        let pairs = complete_pairs(&[Some(1.0), None], &[None, Some(2.0)]);
        assert_eq!(fit(&pairs), Err(RegressionError::InsufficientData { pairs: 0 }));
        assert_eq!(
            fit(&[(1.0, 2.0)]),
            Err(RegressionError::InsufficientData { pairs: 1 })
        );
    }

    #[test]
    fn test_constant_predictor_is_degenerate() {
        let pairs = [(2.0, 1.0), (2.0, 3.0), (2.0, 5.0)];
        assert_eq!(
            fit(&pairs),
            Err(RegressionError::DegeneratePredictor { pairs: 3 })
        );
    }

    #[test]
    fn test_constant_response() {
        let result = fit(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]).unwrap();
        assert_eq!(result.slope, 0.0);
        assert_eq!(result.intercept, 5.0);
        assert_eq!(result.r_squared, 1.0);
    }

    #[test]
    fn test_noisy_fit_r_squared_between_zero_and_one() {
        let pairs = [(0.1, 1.2), (0.2, 1.9), (0.3, 3.4), (0.4, 3.8), (0.5, 5.3)];
        let result = fit(&pairs).unwrap();
        assert!(result.r_squared > 0.9 && result.r_squared < 1.0);
        assert!(result.slope > 9.0 && result.slope < 11.0);
    }

    #[test]
    fn test_fit_is_bit_stable() {
        let pairs = [(0.31, 2.7), (0.12, 1.1), (0.58, 4.9), (0.44, 3.3)];
        let a = fit(&pairs).unwrap();
        let b = fit(&pairs).unwrap();
        assert_eq!(a.slope.to_bits(), b.slope.to_bits());
        assert_eq!(a.intercept.to_bits(), b.intercept.to_bits());
        assert_eq!(a.r_squared.to_bits(), b.r_squared.to_bits());
    }

    #[test]
    fn test_fit_line_spans_observed_range() {
        let pairs = [(1.0, 2.0), (4.0, 8.0), (2.5, 5.0)];
        let result = fit(&pairs).unwrap();
        let line = fit_line(&result, &pairs);

        assert_eq!(line.x.len(), FIT_LINE_POINTS);
        assert_eq!(line.y.len(), FIT_LINE_POINTS);
        assert_eq!(line.x[0], 1.0);
        assert_eq!(line.x[FIT_LINE_POINTS - 1], 4.0);
        assert!(line.x.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(line.y[0], result.predict(1.0));
    }
}
