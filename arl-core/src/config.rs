use crate::error::{Error, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path, str::FromStr};

/// Parameters of one training run. Field names are the config wire format,
/// `elegibility_traces_threshold` spelling included.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainConfig {
    pub frame_skip: u32,
    pub train_episodes: usize,
    pub gamma: f64,
    pub exploration_probability: f64,
    pub step: f64,
    pub lambda: f64,
    pub elegibility_traces_threshold: f64,
}

/// All known training configurations, keyed by feature-mode tag.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSet(HashMap<String, TrainConfig>);

impl ConfigSet {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        fs::read_to_string(path)?.parse()
    }

    pub fn get(&self, mode: &str) -> Result<&TrainConfig> {
        self.0
            .get(mode)
            .ok_or_else(|| Error::UnknownFeatureMode(mode.to_string()))
    }
}

impl FromStr for ConfigSet {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(raw)?))
    }
}

#[cfg(test)]
mod test {
    use super::ConfigSet;
    use crate::error::Error;

    const RAW: &str = r#"{
        "bpros": {
            "frame_skip": 5,
            "train_episodes": 1000,
            "gamma": 0.999,
            "exploration_probability": 0.025,
            "step": 0.01,
            "lambda": 0.9,
            "elegibility_traces_threshold": 0.01
        }
    }"#;

    #[test]
    fn parses_feature_mode_entries() {
        let set: ConfigSet = RAW.parse().unwrap();
        let config = set.get("bpros").unwrap();
        assert_eq!(config.frame_skip, 5);
        assert_eq!(config.train_episodes, 1000);
        assert_eq!(config.gamma, 0.999);
        assert_eq!(config.lambda, 0.9);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let set: ConfigSet = RAW.parse().unwrap();
        assert!(matches!(
            set.get("ram"),
            Err(Error::UnknownFeatureMode(mode)) if mode == "ram"
        ));
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!("{\"bpros\": {}}".parse::<ConfigSet>().is_err());
        assert!("not json".parse::<ConfigSet>().is_err());
    }
}
