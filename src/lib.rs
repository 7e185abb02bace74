//! # siffbench
//!
//! Reads `.siff` files (ScanImage FLIM data in a `BigTiff`
//! container) and measures how long reading them takes.
//!
//! The reader lives in `siffreader` and is reachable through
//! the free functions below. The `harness` module drives any
//! `FrameSource` (the reader included) through timed trial
//! blocks and prints the mean latency of each.
//!
//! ```rust, ignore
//! let reader = siffbench::open_siff("file.siff")?;
//! let frames = reader.get_frames_intensity(&reader.frames_vec(), None)?;
//! let histogram = reader.get_histogram(&reader.frames_vec())?;
//! ```

use std::path::Path;

use ndarray::{Array1, Array3};

mod tiff;
mod data;
mod utils;
pub mod siffreader;
pub mod harness;

pub use siffreader::{SiffReader, RegistrationDict};
pub use utils::FramesError;
pub use data::image::{Dimensions, DimensionsError};

/// Everything that can go wrong reading a `.siff` file
#[derive(Debug)]
pub enum SiffError {
    IOError(std::io::Error),
    FramesError(FramesError),
    DimensionsError(DimensionsError),
}

impl From<std::io::Error> for SiffError {
    fn from(err : std::io::Error) -> Self {
        SiffError::IOError(err)
    }
}

impl From<FramesError> for SiffError {
    fn from(err : FramesError) -> Self {
        SiffError::FramesError(err)
    }
}

impl From<DimensionsError> for SiffError {
    fn from(err : DimensionsError) -> Self {
        SiffError::DimensionsError(err)
    }
}

impl std::error::Error for SiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SiffError::IOError(err) => Some(err),
            SiffError::FramesError(err) => Some(err),
            SiffError::DimensionsError(err) => Some(err),
        }
    }
}

impl std::fmt::Display for SiffError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SiffError::IOError(err) => write!(f, "IOError: {}", err),
            SiffError::FramesError(err) => write!(f, "FramesError: {}", err),
            SiffError::DimensionsError(err) => write!(f, "DimensionsError: {}", err),
        }
    }
}

/// `open_siff(filename)` opens a `.siff` file
/// or a ScanImage-Flim `.tiff` file, reads the header
/// and every IFD, and returns a `SiffReader` object.
///
/// ## Arguments
///
/// * `filename` - Path to the file to open
///
/// ## Example
///
/// ```rust, ignore
/// let reader = open_siff("file.siff");
/// ```
pub fn open_siff<P : AsRef<Path>>(filename : P) -> Result<SiffReader, SiffError> {
    SiffReader::open(filename)
}

/// Opens `filename`, reads the intensity of `frames`
/// (optionally registered) and closes it again.
///
/// ## See also
///
/// * `SiffReader::get_frames_intensity`
pub fn get_frames<P : AsRef<Path>>(
    filename : P,
    frames : &[u64],
    registration : Option<&RegistrationDict>,
) -> Result<Array3<u16>, SiffError> {
    open_siff(filename)?.get_frames_intensity(frames, registration)
}

/// Opens `filename` and returns the arrival-time
/// histogram summed over every frame in the file.
pub fn get_histogram<P : AsRef<Path>>(filename : P) -> Result<Array1<u64>, SiffError> {
    let reader = open_siff(filename)?;
    reader.get_histogram(&reader.frames_vec())
}
