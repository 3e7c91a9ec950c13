//! Shifted window statistics over a team's ordered game log
//!
//! Every function here returns, for position `k`, a value computed from
//! positions strictly before `k`. Position 0 is always `None`.

/// Mean of all values before each position
pub fn shifted_expanding_mean(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (k, v) in values.iter().enumerate() {
        out.push(if k == 0 { None } else { Some(sum / k as f64) });
        sum += v;
    }
    out
}

/// Mean of the (up to) `window` values before each position
pub fn shifted_rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|k| {
            if k == 0 || window == 0 {
                return None;
            }
            let trailing = &values[k.saturating_sub(window)..k];
            Some(trailing.iter().sum::<f64>() / trailing.len() as f64)
        })
        .collect()
}

/// Signed run lengths: wins count up from +1, losses down from -1, and the
/// count restarts whenever the result flips.
pub fn streak_runs(wins: &[bool]) -> Vec<i32> {
    let mut runs: Vec<i32> = Vec::with_capacity(wins.len());
    for (k, &won) in wins.iter().enumerate() {
        let sign = if won { 1 } else { -1 };
        let run = match runs.last() {
            Some(&prev) if k > 0 && wins[k - 1] == won => prev + sign,
            _ => sign,
        };
        runs.push(run);
    }
    runs
}

/// Streak going into each game: the run value after the previous game
pub fn shifted_streak(wins: &[bool]) -> Vec<Option<i32>> {
    shift(&streak_runs(wins))
}

/// Moves every value one position later, leaving `None` at the front
pub fn shift<T: Copy>(values: &[T]) -> Vec<Option<T>> {
    if values.is_empty() {
        return Vec::new();
    }
    std::iter::once(None)
        .chain(values[..values.len() - 1].iter().copied().map(Some))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streak_example() {
        // W W L W W W
        let wins = [true, true, false, true, true, true];
        assert_eq!(streak_runs(&wins), vec![1, 2, -1, 1, 2, 3]);
        assert_eq!(
            shifted_streak(&wins),
            vec![None, Some(1), Some(2), Some(-1), Some(1), Some(2)]
        );
    }

    #[test]
    fn test_losing_streak() {
        let wins = [false, false, false, true];
        assert_eq!(streak_runs(&wins), vec![-1, -2, -3, 1]);
    }

    #[test]
    fn test_expanding_mean() {
        let means = shifted_expanding_mean(&[10.0, -4.0, 6.0, 0.0]);
        assert_eq!(means, vec![None, Some(10.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_rolling_mean_short_history() {
        let means = shifted_rolling_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(
            means,
            vec![None, Some(1.0), Some(1.5), Some(2.5), Some(3.5)]
        );
    }

    #[test]
    fn test_rolling_mean_excludes_current_game() {
        // A huge value at k must not leak into the mean at k
        let mut values = vec![1.0; 10];
        values[7] = 1000.0;
        let means = shifted_rolling_mean(&values, 5);
        assert_eq!(means[7], Some(1.0));
        assert_eq!(means[8], Some((4.0 + 1000.0) / 5.0));
        // Window [k-5, k-1] has moved past the outlier by k = 13
        let mut longer = values.clone();
        longer.extend([1.0; 5]);
        assert_eq!(shifted_rolling_mean(&longer, 5)[13], Some(1.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(shifted_expanding_mean(&[]).is_empty());
        assert!(shifted_rolling_mean(&[], 5).is_empty());
        assert!(shifted_streak(&[]).is_empty());
    }
}
