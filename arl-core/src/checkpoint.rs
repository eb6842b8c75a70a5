use crate::agents::Agent;
use crate::env::ScreenDims;
use crate::error::Result;
use crate::stats::EpisodeResult;
use crate::store::WeightStore;
use crate::video::{VideoBackend, VideoSink};
use std::path::PathBuf;
use tracing::info;

/// Frame rate of best-episode videos.
pub const VIDEO_FPS: u32 = 24;

/// Highest total reward seen so far and the episode that achieved it.
/// Updated monotonically; ties never count as a new best.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BestRecord {
    pub reward: f64,
    pub episode: Option<usize>,
}

/// Identifies a run: game id plus feature-mode tag. Derives the deterministic
/// names used for stats archives, weight snapshots and videos.
#[derive(Debug, Clone)]
pub struct RunTag {
    pub game: String,
    pub features: String,
}

impl RunTag {
    pub fn new(game: impl Into<String>, features: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            features: features.into(),
        }
    }

    pub fn run_name(&self, agent_name: &str) -> String {
        format!("{}-{}-{}", self.game, agent_name, self.features)
    }

    pub fn episode_name(&self, agent_name: &str, episode: usize) -> String {
        format!("{}-{}-{}-{}", self.game, agent_name, self.features, episode)
    }
}

/// Persists a video and a weight snapshot whenever an episode strictly beats
/// the best total reward of the run.
pub struct CheckpointManager<B: VideoBackend> {
    best: BestRecord,
    tag: RunTag,
    store: WeightStore,
    video_dir: PathBuf,
    dims: ScreenDims,
    // None disables best-episode video recording
    backend: Option<B>,
}

impl<B: VideoBackend> CheckpointManager<B> {
    pub fn new(
        tag: RunTag,
        store: WeightStore,
        video_dir: impl Into<PathBuf>,
        dims: ScreenDims,
        backend: Option<B>,
    ) -> Self {
        Self {
            best: BestRecord::default(),
            tag,
            store,
            video_dir: video_dir.into(),
            dims,
            backend,
        }
    }

    pub fn best(&self) -> &BestRecord {
        &self.best
    }

    pub fn records_video(&self) -> bool {
        self.backend.is_some()
    }

    /// Returns whether a checkpoint was written.
    pub fn consider<A: Agent>(
        &mut self,
        episode: usize,
        result: &EpisodeResult,
        agent: &A,
    ) -> Result<bool> {
        if result.total_reward <= self.best.reward {
            return Ok(false);
        }
        self.best = BestRecord {
            reward: result.total_reward,
            episode: Some(episode),
        };
        info!("Best reward: {}", result.total_reward);

        let name = self.tag.episode_name(agent.name(), episode);
        if let Some(backend) = &self.backend {
            let path = self.video_dir.join(format!("{name}.avi"));
            let mut sink = backend.open(&path, VIDEO_FPS, self.dims)?;
            let written = result
                .video_frames
                .iter()
                .try_for_each(|frame| sink.write_frame(frame));
            let finished = sink.finish();
            written?;
            finished?;
        }
        self.store.save(agent.weights(), &name)?;
        Ok(true)
    }
}
