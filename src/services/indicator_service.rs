use crate::models::{IndicatorSet, PriceSeries};

pub const MA50_WINDOW: usize = 50;
pub const MA200_WINDOW: usize = 200;

/// Trailing simple moving average.
///
/// Position `i` holds the mean of `values[i + 1 - window..=i]` once a full window
/// is available and `None` before that. A zero window, or one longer than the
/// input, yields all `None`.
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 || values.len() < window {
        return vec![None; values.len()];
    }

    let mut result = vec![None; window - 1];
    result.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
    );
    result
}

/// MA50 and MA200 over the adjusted close
pub fn compute_indicators(series: &PriceSeries) -> IndicatorSet {
    let adjclose = series.adjclose();

    IndicatorSet {
        ma50: simple_moving_average(&adjclose, MA50_WINDOW),
        ma200: simple_moving_average(&adjclose, MA200_WINDOW),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBar;
    use chrono::{Days, NaiveDate};

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                date: start + Days::new(i as u64),
                open: c,
                high: c,
                low: c,
                close: c,
                adjclose: c,
                volume: 100.0,
            })
            .collect();
        PriceSeries::from_bars("TEST", bars, start, start + Days::new(10_000))
    }

    #[test]
    fn test_constant_series() {
        let series = series_from(&[100.0; 250]);
        let ind = compute_indicators(&series);

        assert_eq!(ind.ma50.len(), 250);
        assert_eq!(ind.ma200.len(), 250);
        for i in 0..250 {
            if i < 49 {
                assert_eq!(ind.ma50[i], None, "ma50 at {}", i);
            } else {
                assert_eq!(ind.ma50[i], Some(100.0), "ma50 at {}", i);
            }
            if i < 199 {
                assert_eq!(ind.ma200[i], None, "ma200 at {}", i);
            } else {
                assert_eq!(ind.ma200[i], Some(100.0), "ma200 at {}", i);
            }
        }
    }

    #[test]
    fn test_trailing_mean_matches_definition() {
        let closes: Vec<f64> = (0..260).map(|i| 50.0 + (i as f64 * 0.37).sin() * 10.0 + i as f64 * 0.1).collect();
        let ind = compute_indicators(&series_from(&closes));

        for i in 0..closes.len() {
            let expected50 = (i >= 49).then(|| closes[i - 49..=i].iter().sum::<f64>() / 50.0);
            let expected200 = (i >= 199).then(|| closes[i - 199..=i].iter().sum::<f64>() / 200.0);
            assert_eq!(ind.ma50[i], expected50, "ma50 at {}", i);
            assert_eq!(ind.ma200[i], expected200, "ma200 at {}", i);
        }
    }

    #[test]
    fn test_window_is_trailing() {
        let sma = simple_moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_short_series_is_all_undefined() {
        let ind = compute_indicators(&series_from(&[10.0; 120]));
        assert!(ind.ma50.iter().skip(49).all(Option::is_some));
        assert_eq!(ind.ma200.len(), 120);
        assert!(ind.ma200.iter().all(Option::is_none));
    }

    #[test]
    fn test_degenerate_windows() {
        assert_eq!(simple_moving_average(&[1.0, 2.0], 0), vec![None, None]);
        assert!(simple_moving_average(&[], 50).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let closes: Vec<f64> = (0..230).map(|i| (i % 17) as f64 + 0.25).collect();
        let series = series_from(&closes);
        assert_eq!(compute_indicators(&series), compute_indicators(&series));
    }
}
