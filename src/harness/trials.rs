//! Times an operation over a fixed number of back-to-back trials.

use std::hint::black_box;
use std::time::{Duration, Instant};

use super::BenchError;

/// Wall-clock time of every trial of one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSummary {
    pub trials : u32,
    pub total : Duration,
    pub mean : Duration,
}

/// Calls `op` exactly `trial_count` times, timing each call
/// including the drop of whatever it returned, and returns the
/// total and mean elapsed time. No warm-up, no outlier rejection.
///
/// The first error aborts the run and is returned.
///
/// ## Errors
///
/// * `BenchError::InvalidTrialCount` - `trial_count` is zero,
/// `op` is never called
///
/// * Whatever `op` returns, converted into `BenchError`
///
/// ## Example
///
/// ```rust, ignore
/// let summary = run_trials(100, || reader.get_frames_intensity(&frames, None))?;
/// println!("{:?} per iter", summary.mean);
/// ```
pub fn run_trials<T, E, F>(trial_count : u32, mut op : F) -> Result<TrialSummary, BenchError>
where
    F : FnMut() -> Result<T, E>,
    BenchError : From<E>,
{
    if trial_count == 0 {
        return Err(BenchError::InvalidTrialCount);
    }

    let mut total = Duration::ZERO;
    for trial in 0..trial_count {
        let start = Instant::now();
        black_box(op()?);
        let elapsed = start.elapsed();
        tracing::trace!(trial, elapsed_us = elapsed.as_micros() as u64, "trial done");
        total += elapsed;
    }

    Ok(TrialSummary {
        trials : trial_count,
        total,
        mean : total / trial_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SiffError, FramesError};

    #[test]
    fn calls_op_once_per_trial() {
        let mut calls = 0u32;
        let summary = run_trials(7, || {
            calls += 1;
            Ok::<_, SiffError>(vec![0u8; 16])
        })
        .unwrap();

        assert_eq!(calls, 7);
        assert_eq!(summary.trials, 7);
        assert!(summary.mean <= summary.total);
        assert_eq!(summary.mean, summary.total / 7);
    }

    #[test]
    fn mean_covers_slow_ops() {
        let summary = run_trials(3, || {
            std::thread::sleep(Duration::from_millis(2));
            Ok::<_, SiffError>(())
        })
        .unwrap();
        assert!(summary.mean >= Duration::from_millis(2));
        assert!(summary.total >= Duration::from_millis(6));
    }

    #[test]
    fn zero_trials_rejected() {
        let mut calls = 0u32;
        let result = run_trials(0, || {
            calls += 1;
            Ok::<_, SiffError>(())
        });
        assert!(matches!(result, Err(BenchError::InvalidTrialCount)));
        assert_eq!(calls, 0);
    }

    #[test]
    fn first_error_aborts() {
        let mut calls = 0u32;
        let result = run_trials(10, || {
            calls += 1;
            if calls == 3 {
                return Err(SiffError::FramesError(FramesError::RegistrationFramesMissing));
            }
            Ok(())
        });
        assert!(matches!(
            result,
            Err(BenchError::Reader(SiffError::FramesError(FramesError::RegistrationFramesMissing)))
        ));
        assert_eq!(calls, 3);
    }
}
