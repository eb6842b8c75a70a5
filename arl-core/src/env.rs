use crate::error::Result;
use derive_more::{Display, From};
use std::path::Path;

/// The screen size every supported game reports. Anything else is fatal at
/// startup.
pub const EXPECTED_SCREEN: ScreenDims = ScreenDims {
    width: 160,
    height: 210,
};

/// Discrete action id taken from the environment's minimal action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From)]
pub struct Action(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display("{width}x{height}")]
pub struct ScreenDims {
    pub width: u32,
    pub height: u32,
}

/// Indexed-pixel screen buffer as reported by the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub screen: Vec<u8>,
}

impl Observation {
    /// The blank screen an episode starts from.
    pub fn zeroed(dims: ScreenDims) -> Self {
        Self {
            screen: vec![0; (dims.width * dims.height) as usize],
        }
    }
}

/// One RGB24 render frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Capability set of the game simulator. Implementations wrap an emulator;
/// the training loop only ever talks through this trait, so tests substitute
/// scripted environments.
pub trait Environment {
    fn load_rom(&mut self, path: &Path) -> Result<()>;

    /// Applies an action for one (frame-skipped) step and returns the raw
    /// reward.
    fn act(&mut self, action: Action) -> Result<f64>;

    fn is_game_over(&self) -> bool;

    fn observation(&self) -> Observation;

    fn render_frame(&self) -> RgbFrame;

    /// Puts the environment back into its initial state for the next episode.
    fn reset(&mut self) -> Result<()>;

    fn minimal_action_set(&self) -> Vec<Action>;

    fn screen_dims(&self) -> ScreenDims;
}
