use crate::trading::market::Bar;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kdj {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

// 通达信风格的加权平滑
fn bcwsma(s: f64, l: usize, m: f64, prev: f64) -> f64 {
    (m * s + (l as f64 - m) * prev) / l as f64
}

/// 计算KDJ序列，K/D用BCWSMA平滑，窗口不足时返回中性值50
pub fn calculate_kdj(bars: &[Bar], period: usize, signal_period: usize) -> Vec<Kdj> {
    let mut kdjs = Vec::with_capacity(bars.len());
    let mut k = 50.0;
    let mut d = 50.0;

    for i in 0..bars.len() {
        if i + 1 >= period {
            let slice = &bars[i + 1 - period..=i];
            let high = slice.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let low = slice.iter().map(|b| b.low).fold(f64::MAX, f64::min);

            let close = bars[i].close;
            let rsv = if (high - low).abs() < f64::EPSILON {
                50.0
            } else {
                (close - low) / (high - low) * 100.0
            };

            k = bcwsma(rsv, signal_period, 1.0, k);
            d = bcwsma(k, signal_period, 1.0, d);
            let j = 3.0 * k - 2.0 * d;
            kdjs.push(Kdj { k, d, j });
        } else {
            kdjs.push(Kdj {
                k: 50.0,
                d: 50.0,
                j: 50.0,
            });
        }
    }

    kdjs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(i as u64),
                    c,
                    c * 1.01,
                    c * 0.99,
                    c,
                    1000.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_kdj_warmup_is_neutral() {
        let bars = bars_from_closes(&[10.0; 20]);
        let kdjs = calculate_kdj(&bars, 9, 3);
        for kdj in &kdjs[..8] {
            assert_eq!(kdj.k, 50.0);
            assert_eq!(kdj.d, 50.0);
            assert_eq!(kdj.j, 50.0);
        }
    }

    #[test]
    fn test_kdj_rally_pushes_j_above_80() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * 1.02f64.powi(i)).collect();
        let bars = bars_from_closes(&closes);
        let kdjs = calculate_kdj(&bars, 9, 3);
        let last = kdjs.last().unwrap();
        assert!(last.j > 80.0, "持续上涨J值应超买，实际{}", last.j);
    }

    #[test]
    fn test_kdj_selloff_pushes_j_below_20() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * 0.98f64.powi(i)).collect();
        let bars = bars_from_closes(&closes);
        let kdjs = calculate_kdj(&bars, 9, 3);
        let last = kdjs.last().unwrap();
        assert!(last.j < 20.0, "持续下跌J值应超卖，实际{}", last.j);
    }

    #[test]
    fn test_kdj_len_matches_input() {
        let bars = bars_from_closes(&[10.0; 15]);
        assert_eq!(calculate_kdj(&bars, 9, 3).len(), 15);
    }
}
