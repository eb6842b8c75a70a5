use crate::agents::Weights;
use crate::env::RgbFrame;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

/// Episodes the windowed statistics average over.
pub const DEFAULT_WINDOW: usize = 50;

/// Outcome of one completed episode. `video_frames` stays empty unless
/// best-episode recording is active.
#[derive(Debug, Clone, Default)]
pub struct EpisodeResult {
    pub total_reward: f64,
    pub frames: usize,
    pub elapsed: Duration,
    pub video_frames: Vec<RgbFrame>,
}

/// Per-episode statistic sequences. Field names are the archive format; every
/// sequence has one entry per completed episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub rewards: Vec<f64>,
    pub avg_rewards_all: Vec<f64>,
    pub avg_rewards_partial: Vec<f64>,
    pub dict_sizes: Vec<usize>,
    pub min_weights: Vec<f64>,
    pub max_weights: Vec<f64>,
    pub avg_weights: Vec<f64>,
    pub num_frames: Vec<usize>,
    pub avg_frames_all: Vec<f64>,
    pub avg_frames_partial: Vec<f64>,
}

impl RunStatistics {
    pub fn episodes(&self) -> usize {
        self.rewards.len()
    }
}

/// Appends per-episode metrics and persists the whole archive after every
/// episode, so a crash loses at most the in-flight episode.
#[derive(Debug)]
pub struct StatisticsAccumulator {
    stats: RunStatistics,
    window: usize,
    stats_dir: PathBuf,
    run_name: String,
}

impl StatisticsAccumulator {
    pub fn new(
        stats_dir: impl Into<PathBuf>,
        run_name: impl Into<String>,
        window: usize,
    ) -> Self {
        Self {
            stats: RunStatistics::default(),
            window,
            stats_dir: stats_dir.into(),
            run_name: run_name.into(),
        }
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn update(&mut self, result: &EpisodeResult, weights: &Weights) -> Result<()> {
        let stats = &mut self.stats;
        stats.rewards.push(result.total_reward);
        stats.avg_rewards_all.push(mean(&stats.rewards));
        stats
            .avg_rewards_partial
            .push(tail_mean(&stats.rewards, self.window));
        stats.dict_sizes.push(weights.len());
        let values: Vec<f64> = weights.values().copied().collect();
        let (min_w, max_w, avg_w) = if values.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max, mean(&values))
        };
        stats.min_weights.push(min_w);
        stats.max_weights.push(max_w);
        stats.avg_weights.push(avg_w);
        stats.num_frames.push(result.frames);
        stats.avg_frames_all.push(mean_usize(&stats.num_frames));
        stats
            .avg_frames_partial
            .push(tail_mean_usize(&stats.num_frames, self.window));
        self.save()
    }

    fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.stats_dir)?;
        let path = self.stats_dir.join(format!("{}.json", self.run_name));
        fs::write(path, serde_json::to_vec(&self.stats)?)?;
        Ok(())
    }
}

/// Reads back a previously persisted archive.
pub fn load_stats(stats_dir: impl AsRef<Path>, run_name: &str) -> Result<RunStatistics> {
    let path = stats_dir.as_ref().join(format!("{run_name}.json"));
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn tail_mean(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    mean(&values[start..])
}

fn mean_usize(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

fn tail_mean_usize(values: &[usize], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    mean_usize(&values[start..])
}

#[cfg(test)]
mod test {
    use super::{EpisodeResult, StatisticsAccumulator, load_stats, tail_mean};
    use crate::agents::Weights;
    use std::time::Duration;

    fn result(total_reward: f64, frames: usize) -> EpisodeResult {
        EpisodeResult {
            total_reward,
            frames,
            elapsed: Duration::from_millis(10),
            video_frames: vec![],
        }
    }

    #[test]
    fn sequences_stay_equal_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut acc = StatisticsAccumulator::new(dir.path(), "run", 3);
        let weights = Weights::from([("a".to_string(), 1.0)]);
        for episode in 0..5 {
            acc.update(&result(episode as f64, 10 * episode), &weights)
                .unwrap();
            let stats = acc.stats();
            let n = episode + 1;
            assert_eq!(stats.rewards.len(), n);
            assert_eq!(stats.avg_rewards_all.len(), n);
            assert_eq!(stats.avg_rewards_partial.len(), n);
            assert_eq!(stats.dict_sizes.len(), n);
            assert_eq!(stats.min_weights.len(), n);
            assert_eq!(stats.max_weights.len(), n);
            assert_eq!(stats.avg_weights.len(), n);
            assert_eq!(stats.num_frames.len(), n);
            assert_eq!(stats.avg_frames_all.len(), n);
            assert_eq!(stats.avg_frames_partial.len(), n);
        }
    }

    #[test]
    fn windowed_mean_clamps_to_history() {
        let dir = tempfile::tempdir().unwrap();
        let window = 3;
        let mut acc = StatisticsAccumulator::new(dir.path(), "run", window);
        let weights = Weights::new();
        let rewards = [1.0, 3.0, 2.0, 5.0, 4.0];
        for &reward in &rewards {
            acc.update(&result(reward, 1), &weights).unwrap();
        }
        let stats = acc.stats();
        for i in 0..rewards.len() {
            let start = (i + 1).saturating_sub(window);
            let expected = tail_mean(&rewards[..=i], window);
            let by_hand: f64 =
                rewards[start..=i].iter().sum::<f64>() / (i + 1 - start) as f64;
            assert_eq!(stats.avg_rewards_partial[i], expected);
            assert!((stats.avg_rewards_partial[i] - by_hand).abs() < 1e-12);
        }
        assert_eq!(stats.avg_rewards_all[4], 3.0);
        assert_eq!(stats.avg_rewards_partial[4], (2.0 + 5.0 + 4.0) / 3.0);
    }

    #[test]
    fn weight_metrics_track_the_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let mut acc = StatisticsAccumulator::new(dir.path(), "run", 50);
        let weights = Weights::from([
            ("a".to_string(), -1.0),
            ("b".to_string(), 4.0),
            ("c".to_string(), 0.0),
        ]);
        acc.update(&result(0.0, 1), &weights).unwrap();
        let stats = acc.stats();
        assert_eq!(stats.dict_sizes[0], 3);
        assert_eq!(stats.min_weights[0], -1.0);
        assert_eq!(stats.max_weights[0], 4.0);
        assert_eq!(stats.avg_weights[0], 1.0);
    }

    #[test]
    fn empty_weight_mapping_contributes_zeros() {
        let dir = tempfile::tempdir().unwrap();
        let mut acc = StatisticsAccumulator::new(dir.path(), "run", 50);
        acc.update(&result(0.0, 1), &Weights::new()).unwrap();
        let stats = acc.stats();
        assert_eq!(stats.dict_sizes[0], 0);
        assert_eq!(stats.min_weights[0], 0.0);
        assert_eq!(stats.max_weights[0], 0.0);
        assert_eq!(stats.avg_weights[0], 0.0);
    }

    #[test]
    fn archive_is_persisted_after_every_episode() {
        let dir = tempfile::tempdir().unwrap();
        let mut acc = StatisticsAccumulator::new(dir.path(), "run", 50);
        let weights = Weights::new();
        acc.update(&result(1.0, 7), &weights).unwrap();
        let on_disk = load_stats(dir.path(), "run").unwrap();
        assert_eq!(&on_disk, acc.stats());
        acc.update(&result(2.0, 8), &weights).unwrap();
        let on_disk = load_stats(dir.path(), "run").unwrap();
        assert_eq!(on_disk.rewards, vec![1.0, 2.0]);
        assert_eq!(on_disk.num_frames, vec![7, 8]);
    }
}
