//! Opens a small and a large sample file, runs each configured
//! trial block against one of them, and writes the mean latency
//! of every block as soon as it is known.
//!
//! Everything runs on the calling thread, one trial after
//! another. Both files stay open for the whole run and are
//! closed when `run` returns, however it returns.

use std::io::Write;

use thiserror::Error;

use crate::SiffError;

pub mod config;
mod report;
mod source;
mod trials;

pub use config::{BenchConfig, ConfigError, Operation, SampleFile, TimeUnit, TrialBlock};
pub use report::Measurement;
pub use source::FrameSource;
pub use trials::{run_trials, TrialSummary};

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("reader error: {0}")]
    Reader(#[from] SiffError),
    #[error("trial count must be at least 1")]
    InvalidTrialCount,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write results: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs every block of `config` in order against files opened
/// with `S`, writing one line per block to `out`.
///
/// Fails fast: an error opening either file happens before any
/// block runs, and an error in a block stops the run without
/// reporting that block.
///
/// ## Example
///
/// ```rust, ignore
/// let config = BenchConfig::with_paths("small.siff", "large.siff");
/// run::<SiffReader, _>(&config, &mut std::io::stdout().lock())?;
/// ```
pub fn run<S, W>(config : &BenchConfig, out : &mut W) -> Result<Vec<Measurement>, BenchError>
where
    S : FrameSource,
    W : Write,
{
    config.validate()?;

    let small = S::open(&config.small_path)?;
    tracing::info!(
        path = %config.small_path.display(),
        frames = small.num_frames(),
        "Opened small"
    );
    let large = S::open(&config.large_path)?;
    tracing::info!(
        path = %config.large_path.display(),
        frames = large.num_frames(),
        "Opened large"
    );

    config
        .blocks
        .iter()
        .map(|block| -> Result<Measurement, BenchError> {
            let source = match block.file {
                SampleFile::Small => &small,
                SampleFile::Large => &large,
            };
            let measurement = run_block(block, source)?;
            writeln!(out, "{}", measurement)?;
            out.flush()?;
            Ok(measurement)
        })
        .collect()
}

/// Times one block against an already opened file
pub fn run_block<S : FrameSource>(block : &TrialBlock, source : &S) -> Result<Measurement, BenchError> {
    tracing::debug!(label = %block.label, trials = block.trials, "running block");
    let summary = match block.operation {
        Operation::ReadFrames { count } => run_trials(block.trials, || {
            let frames : Vec<u64> = (0..count).collect();
            source.read_frames(&frames)
        })?,
        Operation::ReadHistogram => run_trials(block.trials, || source.read_histogram())?,
    };

    Ok(Measurement {
        label : block.label.clone(),
        mean : summary.mean,
        unit : block.unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::Path;

    use crate::tests::{SiffFixture, write_fixture};
    use crate::{DimensionsError, FramesError, SiffReader};

    thread_local! {
        static READS : Cell<u32> = Cell::new(0);
    }

    /// Pretends every file has 40 frames, fails to open
    /// anything named `missing.siff`
    struct CountingSource;

    impl FrameSource for CountingSource {
        type Frames = Vec<u64>;
        type Histogram = u64;

        fn open(path : &Path) -> Result<Self, SiffError> {
            if path.ends_with("missing.siff") {
                return Err(SiffError::IOError(std::io::ErrorKind::NotFound.into()));
            }
            Ok(CountingSource)
        }

        fn num_frames(&self) -> usize {
            40
        }

        fn read_frames(&self, frames : &[u64]) -> Result<Vec<u64>, SiffError> {
            READS.with(|reads| reads.set(reads.get() + 1));
            if frames.iter().any(|&frame| frame >= 40) {
                return Err(DimensionsError::IncorrectFrames.into());
            }
            Ok(frames.to_vec())
        }

        fn read_histogram(&self) -> Result<u64, SiffError> {
            READS.with(|reads| reads.set(reads.get() + 1));
            Ok(40)
        }
    }

    fn small_blocks() -> Vec<TrialBlock> {
        vec![
            TrialBlock::new(
                "Get 40 small frames",
                SampleFile::Small,
                Operation::ReadFrames { count : 40 },
                3,
                TimeUnit::Milliseconds,
            ),
            TrialBlock::new(
                "Get small histogram",
                SampleFile::Small,
                Operation::ReadHistogram,
                2,
                TimeUnit::Milliseconds,
            ),
            TrialBlock::new(
                "Get 40 large frames",
                SampleFile::Large,
                Operation::ReadFrames { count : 40 },
                2,
                TimeUnit::Seconds,
            ),
            TrialBlock::new(
                "Get large histogram",
                SampleFile::Large,
                Operation::ReadHistogram,
                1,
                TimeUnit::Seconds,
            ),
        ]
    }

    fn output_lines(out : Vec<u8>) -> Vec<String> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn runs_each_block_once_per_trial() {
        READS.with(|reads| reads.set(0));
        let mut config = BenchConfig::with_paths("small.siff", "large.siff");
        config.blocks = small_blocks();

        let mut out = Vec::new();
        let measurements = run::<CountingSource, _>(&config, &mut out).unwrap();

        assert_eq!(READS.with(Cell::get), 3 + 2 + 2 + 1);
        assert_eq!(measurements.len(), 4);
        let lines = output_lines(out);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Get 40 small frames: "));
        assert!(lines[0].ends_with(" msec per iter"));
        assert!(lines[3].starts_with("Get large histogram: "));
        assert!(lines[3].ends_with(" sec per iter"));
    }

    #[test]
    fn missing_file_fails_before_any_block() {
        READS.with(|reads| reads.set(0));
        let config = BenchConfig::with_paths("small.siff", "missing.siff");

        let mut out = Vec::new();
        let result = run::<CountingSource, _>(&config, &mut out);

        assert!(matches!(result, Err(BenchError::Reader(SiffError::IOError(_)))));
        assert_eq!(READS.with(Cell::get), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_trials_rejected_before_opening() {
        let mut config = BenchConfig::with_paths("missing.siff", "missing.siff");
        config.blocks[0].trials = 0;
        assert!(matches!(
            run::<CountingSource, _>(&config, &mut Vec::new()),
            Err(BenchError::Config(ConfigError::ZeroTrials { .. }))
        ));

        let mut block = small_blocks().remove(0);
        block.trials = 0;
        assert!(matches!(
            run_block(&block, &CountingSource),
            Err(BenchError::InvalidTrialCount)
        ));
    }

    #[test]
    fn siff_files_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SiffFixture::forty_frames();
        let small = write_fixture(&dir, "small.siff", &fixture);
        let large = write_fixture(&dir, "large.siff", &fixture);

        let mut config = BenchConfig::with_paths(&small, &large);
        config.blocks = small_blocks();

        let mut out = Vec::new();
        let measurements = run::<SiffReader, _>(&config, &mut out).unwrap();
        assert_eq!(
            measurements.iter().map(|m| m.label.as_str()).collect::<Vec<_>>(),
            vec![
                "Get 40 small frames",
                "Get small histogram",
                "Get 40 large frames",
                "Get large histogram",
            ]
        );
        assert!(measurements.iter().all(|m| m.value() >= 0.0));
        assert_eq!(output_lines(out).len(), 4);
    }

    #[test]
    fn out_of_range_block_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SiffFixture::forty_frames();
        let small = write_fixture(&dir, "small.siff", &fixture);
        let large = write_fixture(&dir, "large.siff", &fixture);

        let mut config = BenchConfig::with_paths(&small, &large);
        config.blocks = small_blocks();
        config.blocks[2].operation = Operation::ReadFrames { count : 41 };

        let mut out = Vec::new();
        let result = run::<SiffReader, _>(&config, &mut out);
        assert!(matches!(
            result,
            Err(BenchError::Reader(SiffError::FramesError(FramesError::DimensionsError(
                DimensionsError::IncorrectFrames
            ))))
        ));

        // Only the blocks before the failing one were reported
        assert_eq!(output_lines(out).len(), 2);
    }
}
