use crate::Algorithm;
use crate::agents::Agent;
use crate::checkpoint::{BestRecord, CheckpointManager, RunTag};
use crate::config::TrainConfig;
use crate::env::{Action, EXPECTED_SCREEN, Environment, Observation};
use crate::error::{Error, Result};
use crate::reward::RewardNormalizer;
use crate::rng;
use crate::stats::{DEFAULT_WINDOW, EpisodeResult, RunStatistics, StatisticsAccumulator};
use crate::store::WeightStore;
use crate::video::{MjpgAvi, VideoBackend};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Storage and recording options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Capture render frames and write a video for every new best episode.
    pub record_best: bool,
    /// Episodes the windowed statistics average over.
    pub window: usize,
    pub stats_dir: PathBuf,
    pub video_dir: PathBuf,
    pub weights_dir: PathBuf,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            record_best: true,
            window: DEFAULT_WINDOW,
            stats_dir: "stats".into(),
            video_dir: "video".into(),
            weights_dir: "weights".into(),
        }
    }
}

/// Drives one run of `config.train_episodes` episodes: agent-environment
/// interaction through the run-global reward normalizer, statistics folding
/// after every episode, best-episode checkpointing, and a final weight
/// snapshot tagged with the episode count.
pub struct TrainingLoop<E, A, B: VideoBackend> {
    env: E,
    agent: A,
    config: TrainConfig,
    tag: RunTag,
    normalizer: RewardNormalizer,
    stats: StatisticsAccumulator,
    checkpoints: CheckpointManager<B>,
    store: WeightStore,
}

impl<E: Environment, A: Agent, B: VideoBackend> TrainingLoop<E, A, B> {
    pub fn new(
        env: E,
        agent: A,
        config: TrainConfig,
        tag: RunTag,
        backend: B,
        options: RunOptions,
    ) -> Self {
        let store = WeightStore::new(&options.weights_dir);
        let stats = StatisticsAccumulator::new(
            &options.stats_dir,
            tag.run_name(agent.name()),
            options.window,
        );
        let checkpoints = CheckpointManager::new(
            tag.clone(),
            store.clone(),
            &options.video_dir,
            env.screen_dims(),
            options.record_best.then_some(backend),
        );
        Self {
            env,
            agent,
            config,
            tag,
            normalizer: RewardNormalizer::new(),
            stats,
            checkpoints,
            store,
        }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn best(&self) -> &BestRecord {
        self.checkpoints.best()
    }

    fn run_episode(&mut self, actions: &[Action]) -> Result<EpisodeResult> {
        let record = self.checkpoints.records_video();
        // The initial action is drawn uniformly; on-policy agents ignore it
        // by immediately returning their own choice from the feedback call.
        let mut forced = rng::choose(actions);
        let mut state = Observation::zeroed(self.env.screen_dims());
        self.agent.begin_episode(&state);

        let mut total_reward = 0.0;
        let mut frames = 0;
        let mut video_frames = Vec::new();
        let start = Instant::now();

        while !self.env.is_game_over() {
            let action = match forced.take() {
                Some(action) => action,
                None => self.agent.choose_action(&state),
            };
            let raw = self.env.act(action)?;
            total_reward += raw;
            let scaled = self.normalizer.normalize(raw);

            let next = if self.env.is_game_over() {
                None
            } else {
                if record {
                    video_frames.push(self.env.render_frame());
                }
                Some(self.env.observation())
            };
            forced = self
                .agent
                .incorporate_feedback(&state, action, scaled, next.as_ref());
            if let Some(next) = next {
                state = next;
            }
            frames += 1;
        }

        Ok(EpisodeResult {
            total_reward,
            frames,
            elapsed: start.elapsed(),
            video_frames,
        })
    }
}

impl<E: Environment, A: Agent, B: VideoBackend> Algorithm for TrainingLoop<E, A, B> {
    type Stats = RunStatistics;

    fn train(&mut self) -> Result<RunStatistics> {
        let dims = self.env.screen_dims();
        if dims != EXPECTED_SCREEN {
            return Err(Error::ScreenDims {
                got: dims,
                want: EXPECTED_SCREEN,
            });
        }

        info!("Starting training");
        let actions = self.agent.actions().to_vec();
        for episode in 0..self.config.train_episodes {
            let result = self.run_episode(&actions)?;
            info!(
                "episode: {}, score: {}, number of frames: {}, time: {:.4}m",
                episode,
                result.total_reward,
                result.frames,
                result.elapsed.as_secs_f64() / 60.0
            );
            self.stats.update(&result, self.agent.weights())?;
            self.checkpoints.consider(episode, &result, &self.agent)?;
            self.env.reset()?;
        }
        info!("Ending training");

        let final_name = self
            .tag
            .episode_name(self.agent.name(), self.config.train_episodes);
        self.store.save(self.agent.weights(), &final_name)?;
        Ok(self.stats.stats().clone())
    }
}

/// Runs a whole training session with the default MJPG/AVI backend.
pub fn run<E: Environment, A: Agent>(
    env: E,
    agent: A,
    config: TrainConfig,
    tag: RunTag,
    options: RunOptions,
) -> Result<RunStatistics> {
    let mut training = TrainingLoop::new(env, agent, config, tag, MjpgAvi::default(), options);
    training.train()
}
