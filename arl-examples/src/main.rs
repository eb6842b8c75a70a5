//! Runs the training loop end to end against a synthetic game, so the whole
//! pipeline (normalization, statistics, checkpoints, videos) can be exercised
//! without an emulator.

use arl_core::Algorithm;
use arl_core::agents::{Agent, Weights};
use arl_core::background::load_background;
use arl_core::checkpoint::RunTag;
use arl_core::config::{ConfigSet, TrainConfig};
use arl_core::env::{Action, Environment, Observation, RgbFrame, ScreenDims};
use arl_core::error::{Error, Result};
use arl_core::rng;
use arl_core::store::WeightStore;
use arl_core::training_loop::{RunOptions, TrainingLoop};
use arl_core::video::MjpgAvi;
use rand::Rng;
use std::path::Path;
use tracing::{info, warn};

const GAME: &str = "space_invaders";
const FEATURES: &str = "bpros";
const LOAD_WEIGHTS: bool = false;
const LOAD_WEIGHTS_NAME: &str = "space_invaders-demo-bpros-resume";

const DIMS: ScreenDims = ScreenDims {
    width: 160,
    height: 210,
};

/// Synthetic stand-in for the emulator: a hidden target action drifts over
/// the episode and paying attention to it is rewarded every 37th step.
struct DemoEnv {
    step: u32,
    episode_len: u32,
    num_actions: u32,
}

impl DemoEnv {
    fn new(frame_skip: u32) -> Self {
        Self {
            step: 0,
            episode_len: 36 * frame_skip,
            num_actions: 4,
        }
    }

    fn target(&self) -> u32 {
        (self.step / 37) % self.num_actions
    }
}

impl Environment for DemoEnv {
    fn load_rom(&mut self, path: &Path) -> Result<()> {
        info!("loading rom {}", path.display());
        Ok(())
    }

    fn act(&mut self, action: Action) -> Result<f64> {
        let reward = if self.step % 37 == 0 && action.0 == self.target() {
            10.0
        } else {
            0.0
        };
        self.step += 1;
        Ok(reward)
    }

    fn is_game_over(&self) -> bool {
        self.step >= self.episode_len
    }

    fn observation(&self) -> Observation {
        let mut screen = vec![0u8; (DIMS.width * DIMS.height) as usize];
        let column = (self.target() * DIMS.width / self.num_actions) as usize;
        for row in 0..DIMS.height as usize {
            screen[row * DIMS.width as usize + column] = 255;
        }
        Observation { screen }
    }

    fn render_frame(&self) -> RgbFrame {
        let mut data = vec![0u8; (DIMS.width * DIMS.height * 3) as usize];
        for (i, value) in data.iter_mut().enumerate() {
            *value = ((i as u32 / 3 + self.step * 2) % 256) as u8;
        }
        RgbFrame {
            width: DIMS.width,
            height: DIMS.height,
            data,
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.step = 0;
        Ok(())
    }

    fn minimal_action_set(&self) -> Vec<Action> {
        (0..self.num_actions).map(Action).collect()
    }

    fn screen_dims(&self) -> ScreenDims {
        DIMS
    }
}

/// Minimal epsilon-greedy agent keeping one weight per action. Stands in for
/// a real learning algorithm so the loop has something to drive.
struct DemoAgent {
    actions: Vec<Action>,
    weights: Weights,
    exploration: f64,
    step_size: f64,
}

impl DemoAgent {
    fn new(actions: Vec<Action>, config: &TrainConfig) -> Self {
        Self {
            actions,
            weights: Weights::new(),
            exploration: config.exploration_probability,
            step_size: config.step,
        }
    }

    fn key(action: Action) -> String {
        format!("action:{action}")
    }
}

impl Agent for DemoAgent {
    fn begin_episode(&mut self, _state: &Observation) {}

    fn choose_action(&mut self, _state: &Observation) -> Action {
        let explore = rng::with_rng(|rng| rng.random_bool(self.exploration));
        if explore {
            return rng::choose(&self.actions).expect("nonempty action set");
        }
        *self
            .actions
            .iter()
            .max_by(|a, b| {
                let wa = self.weights.get(&Self::key(**a)).unwrap_or(&0.0);
                let wb = self.weights.get(&Self::key(**b)).unwrap_or(&0.0);
                wa.total_cmp(wb)
            })
            .expect("nonempty action set")
    }

    fn incorporate_feedback(
        &mut self,
        _state: &Observation,
        action: Action,
        reward: f64,
        _next_state: Option<&Observation>,
    ) -> Option<Action> {
        let weight = self.weights.entry(Self::key(action)).or_insert(0.0);
        *weight += self.step_size * (reward - *weight);
        None
    }

    fn weights(&self) -> &Weights {
        &self.weights
    }

    fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn name(&self) -> &str {
        "demo"
    }
}

fn run() -> Result<()> {
    let config_set: ConfigSet = include_str!("../config.json").parse()?;
    let config = config_set.get(FEATURES)?.clone();
    rng::seed(42);

    let mut env = DemoEnv::new(config.frame_skip);
    env.load_rom(Path::new("roms/space_invaders.bin"))?;

    if Path::new("backgrounds").join(format!("{GAME}.bg")).exists() {
        let background = load_background("backgrounds", GAME)?;
        info!(
            "loaded background {}x{}",
            background.width(),
            background.height()
        );
    }

    let mut agent = DemoAgent::new(env.minimal_action_set(), &config);
    if LOAD_WEIGHTS {
        match WeightStore::default().load(LOAD_WEIGHTS_NAME) {
            Ok(weights) => agent.weights = weights,
            Err(Error::WeightsNotFound { path }) => {
                warn!("weight file {} not found, starting fresh", path.display());
            }
            Err(err) => return Err(err),
        }
    }

    let mut training = TrainingLoop::new(
        env,
        agent,
        config,
        RunTag::new(GAME, FEATURES),
        MjpgAvi::default(),
        RunOptions::default(),
    );
    let stats = training.train()?;
    info!(
        "episodes: {}, final avg reward: {:.2}, best: {} (episode {:?})",
        stats.episodes(),
        stats.avg_rewards_all.last().unwrap_or(&0.0),
        training.best().reward,
        training.best().episode,
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
