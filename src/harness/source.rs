//! The seam between the harness and whatever reads the files.

use std::path::Path;

use ndarray::{Array1, Array3};

use crate::{SiffError, SiffReader};

/// An opened sample file the harness can time reads against.
/// Results are only ever handed to `black_box`, the harness
/// never looks inside them.
pub trait FrameSource : Sized {
    type Frames;
    type Histogram;

    fn open(path : &Path) -> Result<Self, SiffError>;

    fn num_frames(&self) -> usize;

    /// Reads the requested frames, in order
    fn read_frames(&self, frames : &[u64]) -> Result<Self::Frames, SiffError>;

    /// Histogram over every frame of the file
    fn read_histogram(&self) -> Result<Self::Histogram, SiffError>;
}

impl FrameSource for SiffReader {
    type Frames = Array3<u16>;
    type Histogram = Array1<u64>;

    fn open(path : &Path) -> Result<Self, SiffError> {
        SiffReader::open(path)
    }

    fn num_frames(&self) -> usize {
        SiffReader::num_frames(self)
    }

    fn read_frames(&self, frames : &[u64]) -> Result<Array3<u16>, SiffError> {
        self.get_frames_intensity(frames, None)
    }

    fn read_histogram(&self) -> Result<Array1<u64>, SiffError> {
        self.get_histogram(&self.frames_vec())
    }
}
