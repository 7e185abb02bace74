//! `BenchConfig`: which two sample files to open and the
//! ordered list of trial blocks to run against them.
//!
//! ```toml
//! small_path = "/data/small.siff"
//! large_path = "/data/large.siff"
//!
//! [[blocks]]
//! label = "Get 40 small frames"
//! file = "small"
//! trials = 100
//! unit = "milliseconds"
//! operation = { kind = "read_frames", count = 40 }
//! ```
//!
//! Leaving out `blocks` runs the default table.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFile {
    Small,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Read frames `0..count`
    ReadFrames { count : u64 },
    /// Histogram over every frame in the file
    ReadHistogram,
}

/// Unit a block's mean is reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    /// Multiplier from seconds
    pub fn scale(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1000.0,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "sec",
            TimeUnit::Milliseconds => "msec",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrialBlock {
    pub label : String,
    pub file : SampleFile,
    pub trials : u32,
    pub unit : TimeUnit,
    pub operation : Operation,
}

impl TrialBlock {
    pub fn new(
        label : &str,
        file : SampleFile,
        operation : Operation,
        trials : u32,
        unit : TimeUnit,
    ) -> Self {
        Self {
            label : label.to_string(),
            file,
            operation,
            trials,
            unit,
        }
    }
}

/// 40 frames and a histogram from the small file, 50000
/// frames and a histogram from the large one.
pub fn default_blocks() -> Vec<TrialBlock> {
    vec![
        TrialBlock::new(
            "Get 40 small frames",
            SampleFile::Small,
            Operation::ReadFrames { count : 40 },
            100,
            TimeUnit::Milliseconds,
        ),
        TrialBlock::new(
            "Get small histogram",
            SampleFile::Small,
            Operation::ReadHistogram,
            100,
            TimeUnit::Milliseconds,
        ),
        TrialBlock::new(
            "Get 50000 large frames",
            SampleFile::Large,
            Operation::ReadFrames { count : 50000 },
            30,
            TimeUnit::Seconds,
        ),
        TrialBlock::new(
            "Get large histogram",
            SampleFile::Large,
            Operation::ReadHistogram,
            30,
            TimeUnit::Seconds,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    pub small_path : PathBuf,
    pub large_path : PathBuf,
    pub blocks : Vec<TrialBlock>,
}

/// The config file as written, before CLI overrides
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    small_path : Option<PathBuf>,
    large_path : Option<PathBuf>,
    blocks : Option<Vec<TrialBlock>>,
}

impl BenchConfig {
    /// Default block table against the two given files
    pub fn with_paths(small : impl Into<PathBuf>, large : impl Into<PathBuf>) -> Self {
        Self {
            small_path : small.into(),
            large_path : large.into(),
            blocks : default_blocks(),
        }
    }

    pub fn from_toml_file(path : &Path) -> Result<Self, ConfigError> {
        Self::load(Some(path), None, None)
    }

    /// Reads `config` if given, then lets `small` and `large`
    /// override its paths. Without a config file both paths
    /// are required. The result is validated.
    pub fn load(
        config : Option<&Path>,
        small : Option<PathBuf>,
        large : Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let raw = match config {
            Some(path) => read_file(path)?,
            None => RawConfig::default(),
        };

        let (small_path, large_path) = match (small.or(raw.small_path), large.or(raw.large_path)) {
            (Some(small), Some(large)) => (small, large),
            _ => return Err(ConfigError::MissingPaths),
        };

        let config = Self {
            small_path,
            large_path,
            blocks : raw.blocks.unwrap_or_else(default_blocks),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, block) in self.blocks.iter().enumerate() {
            if block.label.trim().is_empty() {
                return Err(ConfigError::EmptyLabel { index });
            }
            if block.trials == 0 {
                return Err(ConfigError::ZeroTrials {
                    label : block.label.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|source| ConfigError::Serialize { source })
    }
}

fn read_file(path : &Path) -> Result<RawConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path : path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path : path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read bench config {path}: {source}")]
    Read {
        path : PathBuf,
        source : std::io::Error,
    },
    #[error("failed to parse bench config {path}: {source}")]
    Parse {
        path : PathBuf,
        source : toml::de::Error,
    },
    #[error("failed to serialize bench config: {source}")]
    Serialize { source : toml::ser::Error },
    #[error("block '{label}' must run at least one trial")]
    ZeroTrials { label : String },
    #[error("block {index} has an empty label")]
    EmptyLabel { index : usize },
    #[error("both a small and a large sample file are required")]
    MissingPaths,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_table() {
        let blocks = default_blocks();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].label, "Get 40 small frames");
        assert_eq!(blocks[0].operation, Operation::ReadFrames { count : 40 });
        assert_eq!(blocks[0].trials, 100);
        assert_eq!(blocks[2].file, SampleFile::Large);
        assert_eq!(blocks[2].operation, Operation::ReadFrames { count : 50000 });
        assert_eq!(blocks[3].unit, TimeUnit::Seconds);
        assert_eq!(blocks[3].trials, 30);
    }

    #[test]
    fn toml_round_trip() {
        let dir = tempdir().unwrap();
        let config = BenchConfig::with_paths("/data/small.siff", "/data/large.siff");
        let path = dir.path().join("bench.toml");
        fs::write(&path, config.to_toml().unwrap()).unwrap();

        assert_eq!(BenchConfig::from_toml_file(&path).unwrap(), config);
    }

    #[test]
    fn parse_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        fs::write(
            &path,
            r#"
small_path = "small.siff"
large_path = "large.siff"

[[blocks]]
label = "Small histogram"
file = "small"
trials = 5
unit = "milliseconds"
operation = { kind = "read_histogram" }
"#,
        )
        .unwrap();

        let config = BenchConfig::from_toml_file(&path).unwrap();
        assert_eq!(
            config.blocks,
            vec![TrialBlock::new(
                "Small histogram",
                SampleFile::Small,
                Operation::ReadHistogram,
                5,
                TimeUnit::Milliseconds,
            )]
        );
    }

    #[test]
    fn cli_paths_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        fs::write(&path, "small_path = \"a.siff\"\nlarge_path = \"b.siff\"\n").unwrap();

        let config =
            BenchConfig::load(Some(&path), None, Some(PathBuf::from("c.siff"))).unwrap();
        assert_eq!(config.small_path, PathBuf::from("a.siff"));
        assert_eq!(config.large_path, PathBuf::from("c.siff"));
        assert_eq!(config.blocks, default_blocks());

        assert!(matches!(
            BenchConfig::load(None, Some(PathBuf::from("a.siff")), None),
            Err(ConfigError::MissingPaths)
        ));
    }

    #[test]
    fn rejects_bad_blocks() {
        let mut config = BenchConfig::with_paths("a.siff", "b.siff");
        config.blocks[1].trials = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroTrials { label }) if label == "Get small histogram"
        ));

        let mut config = BenchConfig::with_paths("a.siff", "b.siff");
        config.blocks[2].label = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyLabel { index : 2 })));
    }

    #[test]
    fn read_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            BenchConfig::from_toml_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let garbled = dir.path().join("garbled.toml");
        fs::write(&garbled, "small_path = [").unwrap();
        assert!(matches!(
            BenchConfig::from_toml_file(&garbled),
            Err(ConfigError::Parse { .. })
        ));

        let unknown = dir.path().join("unknown.toml");
        fs::write(&unknown, "small = \"a.siff\"\n").unwrap();
        assert!(matches!(
            BenchConfig::from_toml_file(&unknown),
            Err(ConfigError::Parse { .. })
        ));
    }
}
