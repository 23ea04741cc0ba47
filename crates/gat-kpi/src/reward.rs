use chrono::NaiveDateTime;

/// Instantaneous and running-cumulative reward of one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardRow {
    pub timestep: usize,
    pub timestamp: NaiveDateTime,
    pub reward: f64,
    pub cum_reward: f64,
}

/// Running sum over rewards pushed in timestep order. No smoothing,
/// clipping or normalization.
#[derive(Debug, Clone, Default)]
pub struct RewardAccumulator {
    running: f64,
    rows: Vec<RewardRow>,
}

impl RewardAccumulator {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            running: 0.0,
            rows: Vec::with_capacity(size),
        }
    }

    pub fn push(&mut self, timestamp: NaiveDateTime, reward: f64) -> RewardRow {
        self.running += reward;
        let row = RewardRow {
            timestep: self.rows.len(),
            timestamp,
            reward,
            cum_reward: self.running,
        };
        self.rows.push(row);
        row
    }

    pub fn total(&self) -> f64 {
        self.running
    }

    pub fn finish(self) -> Vec<RewardRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn cumulative_is_prefix_sum() {
        let rewards = [0.1, 0.7, -0.3, 12.5, 1e-9];
        let mut acc = RewardAccumulator::with_capacity(rewards.len());
        for reward in rewards {
            acc.push(ts(), reward);
        }
        assert_eq!(acc.total(), rewards.iter().sum::<f64>());
        let rows = acc.finish();
        for (t, row) in rows.iter().enumerate() {
            assert_eq!(row.timestep, t);
            assert_eq!(row.reward, rewards[t]);
            assert_eq!(row.cum_reward, rewards[..=t].iter().sum::<f64>());
        }
    }

    #[test]
    fn negative_rewards_are_not_clipped() {
        let mut acc = RewardAccumulator::default();
        let row = acc.push(ts(), -5.0);
        assert_eq!(row.cum_reward, -5.0);
    }
}
