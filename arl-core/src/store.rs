use crate::agents::Weights;
use crate::error::{Error, Result};
use std::{fs, io::ErrorKind, path::PathBuf};

/// Persists weight mappings under `<dir>/<name>.bin`. Snapshots round-trip
/// exactly.
#[derive(Debug, Clone)]
pub struct WeightStore {
    dir: PathBuf,
}

impl Default for WeightStore {
    fn default() -> Self {
        Self::new("weights")
    }
}

impl WeightStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.bin"))
    }

    pub fn save(&self, weights: &Weights, name: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let bytes = bincode::serde::encode_to_vec(weights, bincode::config::standard())?;
        fs::write(self.path(name), bytes)?;
        Ok(())
    }

    /// Fails with [`Error::WeightsNotFound`] when no snapshot exists under
    /// `name`; the caller decides whether to reinitialize or abort.
    pub fn load(&self, name: &str) -> Result<Weights> {
        let path = self.path(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::WeightsNotFound { path });
            }
            Err(err) => return Err(err.into()),
        };
        let (weights, _) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        Ok(weights)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }
}

#[cfg(test)]
mod test {
    use super::WeightStore;
    use crate::agents::Weights;
    use crate::error::Error;

    #[test]
    fn round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        let weights = Weights::from([
            ("ball-x:12".to_string(), 0.1 + 0.2),
            ("phi:3,7".to_string(), -1.5e-17),
            ("bias".to_string(), f64::MAX),
        ]);
        store.save(&weights, "x").unwrap();
        let loaded = store.load("x").unwrap();
        assert_eq!(loaded, weights);
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, Error::WeightsNotFound { .. }));
    }

    #[test]
    fn not_found_is_distinguishable_from_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeightStore::new(dir.path());
        store.save(&Weights::new(), "empty").unwrap();
        assert_eq!(store.load("empty").unwrap(), Weights::new());
        assert!(matches!(
            store.load("missing"),
            Err(Error::WeightsNotFound { .. })
        ));
    }
}
