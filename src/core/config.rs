//! Purpose: Immutable run configuration for `gen` and `run`.
//! Role: Built once from CLI args, then passed by reference into the generator and store.
//! Invariants: Sizes, scale, buffer size, and ratios are positive once constructed.
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::error::{Error, ErrorKind};
use crate::core::row::RowLayout;

pub const DEFAULT_KEY_SIZE: usize = 8;
pub const DEFAULT_VAL_SIZE: usize = 8;
pub const DEFAULT_SCALE: usize = 100;

#[derive(Clone, Debug)]
pub struct GenConfig {
    pub dir: PathBuf,
    pub layout: RowLayout,
    pub scale: usize,
    pub seed: u64,
}

impl GenConfig {
    /// Without an explicit seed, the wall clock seeds the generator.
    pub fn new(
        dir: impl Into<PathBuf>,
        key_size: usize,
        val_size: usize,
        scale: usize,
        seed: Option<u64>,
    ) -> Result<Self, Error> {
        let layout = RowLayout::new(key_size, val_size)?;
        if scale == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message("scale must be positive"));
        }
        Ok(Self {
            dir: dir.into(),
            layout,
            scale,
            seed: seed.unwrap_or_else(clock_seed),
        })
    }
}

/// Parameters for a future external sort; only validated and reported today.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub dir: PathBuf,
    pub buf_size: usize,
    pub input_ratio: usize,
    pub output_ratio: usize,
}

impl RunConfig {
    pub fn new(
        dir: impl Into<PathBuf>,
        buf_size: usize,
        input_ratio: usize,
        output_ratio: usize,
    ) -> Result<Self, Error> {
        for (name, value) in [
            ("buffer size", buf_size),
            ("input ratio", input_ratio),
            ("output ratio", output_ratio),
        ] {
            if value == 0 {
                return Err(
                    Error::new(ErrorKind::Usage).with_message(format!("{name} must be positive"))
                );
            }
        }
        Ok(Self {
            dir: dir.into(),
            buf_size,
            input_ratio,
            output_ratio,
        })
    }
}

pub fn default_data_dir() -> Result<PathBuf, Error> {
    std::env::current_dir().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to resolve working directory")
            .with_source(err)
    })
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| fold_nanos(elapsed.as_nanos()))
        .unwrap_or_default()
}

// Folds both halves so the seed keeps varying past the u64 nanosecond range.
fn fold_nanos(nanos: u128) -> u64 {
    let low = u64::try_from(nanos & u128::from(u64::MAX)).unwrap_or(u64::MAX);
    let high = u64::try_from(nanos >> 64).unwrap_or(u64::MAX);
    low ^ high
}

#[cfg(test)]
mod tests {
    use super::{GenConfig, RunConfig, fold_nanos};
    use crate::core::error::ErrorKind;

    #[test]
    fn gen_config_rejects_non_positive_values() {
        assert_eq!(
            GenConfig::new("/tmp", 0, 1, 1, None).unwrap_err().kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            GenConfig::new("/tmp", 1, 0, 1, None).unwrap_err().kind(),
            ErrorKind::Usage
        );
        assert_eq!(
            GenConfig::new("/tmp", 1, 1, 0, None).unwrap_err().kind(),
            ErrorKind::Usage
        );
    }

    #[test]
    fn explicit_seed_is_kept() {
        let config = GenConfig::new("/tmp", 2, 1, 3, Some(42)).expect("config");
        assert_eq!(config.seed, 42);
        assert_eq!(config.layout.field_count(), 4);
    }

    #[test]
    fn nanos_fold_without_truncation() {
        assert_eq!(fold_nanos(42), 42);
        assert_eq!(fold_nanos(u128::from(u64::MAX)), u64::MAX);
        assert_eq!(fold_nanos((1u128 << 64) | 5), 4);
    }

    #[test]
    fn run_config_rejects_zero_ratio() {
        let err = RunConfig::new("/tmp", 1024, 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.message(), Some("input ratio must be positive"));
        assert!(RunConfig::new("/tmp", 1024, 1, 1).is_ok());
    }
}
