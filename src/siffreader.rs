//! The primary `SiffReader` object, which
//! parses files and extracts frame data
//! and arrival-time histograms.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    SiffError,
    data::image::{
        Dimensions,
        DimensionsError,
        load_array_intensity,
        load_array_intensity_registered,
        load_histogram,
        check_frame_layout,
    },
    tiff::{BigTiffIFD, FileFormat, IFD},
    utils::{parallelize_op, FramesError},
};

/// Pixel shifts `(y, x)` to apply to each frame, keyed by frame number
pub type RegistrationDict = HashMap<u64, (i32, i32)>;

/// Frames handed to each worker thread at a time
const FRAMES_PER_CHUNK : usize = 2500;

/// A struct for reading a `.siff` file
/// or a ScanImage-Flim `.tiff` file.
/// Holds the parsed header and every IFD, so
/// reading frames never has to walk the file again.
pub struct SiffReader {
    _file : File,
    _filename : PathBuf,
    file_format : FileFormat,
    _ifds : Vec<BigTiffIFD>,
    _image_dims : Option<Dimensions>,
}

impl SiffReader{

    /// Opens a file
    ///
    /// # Arguments
    ///
    /// * `filename` - A path to the file to open
    ///
    /// # Errors
    ///
    /// * `SiffError::IOError` - if the file can't be opened
    ///
    /// * `SiffError::FramesError` - if the header or IFDs
    /// can't be parsed, or a frame's shape or data strip
    /// doesn't fit in the file
    ///
    /// # Example
    ///
    /// ```rust, ignore
    /// let reader = SiffReader::open("file.siff");
    /// ```
    pub fn open<P : AsRef<Path>>(filename : P) -> Result<Self, SiffError> {
        let file = File::open(&filename)?;
        let mut buff = BufReader::new(&file);

        let file_format = FileFormat::parse_filetype(&mut buff)?;
        let ifds = file_format.get_ifd_vec(&mut buff)?;

        let file_len = file.metadata()?.len();
        ifds.iter().try_for_each(|ifd| check_frame_layout(ifd, file_len))?;

        let image_dims = ifds.iter()
            .map(|ifd| ifd.dimensions())
            .all_equal_value()
            .ok()
            .flatten();

        tracing::debug!(
            file = %filename.as_ref().display(),
            frames = ifds.len(),
            bigtiff = file_format.bigtiff,
            "opened siff file"
        );

        Ok(SiffReader {
            _filename : filename.as_ref().to_path_buf(),
            file_format,
            _ifds : ifds,
            _image_dims : image_dims,
            _file : file,
        })
    }

    /// Path the reader was opened with
    pub fn filename(&self) -> &Path {
        &self._filename
    }

    pub fn num_frames(&self) -> usize {
        self._ifds.len()
    }

    /// Every frame number in the file, in order
    pub fn frames_vec(&self) -> Vec<u64> {
        (0..self.num_frames() as u64).collect()
    }

    /// The shape shared by every frame of the file, or
    /// `None` if the frames don't all agree.
    pub fn image_dims(&self) -> Option<Dimensions> {
        self._image_dims
    }

    pub fn num_flim_tau_bins(&self) -> Option<u32> {
        self.file_format.num_flim_tau_bins()
    }

    /// Errors if any frame is past the end of the file
    fn check_frames_in_bounds(&self, frames : &[u64]) -> Result<(), FramesError> {
        let n_frames = self.num_frames() as u64;
        match frames.iter().find(|&&frame| frame >= n_frames) {
            Some(frame) => {
                tracing::debug!(frame, n_frames, "requested frame out of bounds");
                Err(DimensionsError::IncorrectFrames.into())
            },
            None => Ok(()),
        }
    }

    /// The shape shared by all of `frames`, presuming
    /// they're in bounds.
    fn frames_dims(&self, frames : &[u64]) -> Result<Dimensions, FramesError> {
        if frames.is_empty() {
            return Ok(self._image_dims.unwrap_or(Dimensions::new(0, 0)));
        }
        if let Some(dims) = self._image_dims {
            return Ok(dims);
        }
        frames.iter()
            .map(|&frame| self._ifds[frame as usize].dimensions())
            .all_equal_value()
            .ok()
            .flatten()
            .ok_or(DimensionsError::NoConsistentDimensions.into())
    }

    /// Returns the intensity data of the requested frames
    /// as an array of shape `(frames.len(), y, x)`, optionally
    /// shifting each frame by its entry in `registration`.
    ///
    /// ## Arguments
    ///
    /// * `frames` - Frame numbers to read, in the order they
    /// should appear in the returned array
    ///
    /// * `registration` - Optional pixel shifts for each frame.
    /// Every requested frame must have an entry.
    ///
    /// ## Errors
    ///
    /// * `FramesError::DimensionsError(IncorrectFrames)` - a frame
    /// number is `>= num_frames()`
    ///
    /// * `FramesError::DimensionsError(NoConsistentDimensions)` - the
    /// requested frames are not all the same shape
    ///
    /// * `FramesError::RegistrationFramesMissing` - `registration`
    /// is missing one of `frames`
    ///
    /// ## Example
    ///
    /// ```rust, ignore
    /// let reader = SiffReader::open("file.siff").unwrap();
    /// let frames = reader.get_frames_intensity(&[0, 1, 2], None).unwrap();
    /// assert_eq!(frames.shape()[0], 3);
    /// ```
    pub fn get_frames_intensity(
        &self,
        frames : &[u64],
        registration : Option<&RegistrationDict>,
    ) -> Result<Array3<u16>, SiffError> {
        self.check_frames_in_bounds(frames)?;
        let dims = self.frames_dims(frames)?;

        if let Some(registration) = registration {
            if !frames.iter().all(|frame| registration.contains_key(frame)) {
                return Err(FramesError::RegistrationFramesMissing.into());
            }
        }

        let mut array = Array3::<u16>::zeros(
            (frames.len(), dims.ydim as usize, dims.xdim as usize)
        );

        let op = |local_frames : &[u64], chunk : &mut ArrayViewMut3<u16>, reader : &mut BufReader<File>|
        -> Result<(), FramesError> {
            local_frames.iter().zip(chunk.axis_iter_mut(Axis(0)))
                .try_for_each(|(&frame, mut frame_array)| {
                    let ifd = &self._ifds[frame as usize];
                    match registration {
                        Some(reg) => load_array_intensity_registered(
                            reader, ifd, &mut frame_array, reg[&frame]
                        ),
                        None => load_array_intensity(reader, ifd, &mut frame_array),
                    }
                })
        };

        parallelize_op!(array, FRAMES_PER_CHUNK, frames, self._filename, op)?;
        Ok(array)
    }

    /// Returns a histogram of photon arrival times summed
    /// over all of `frames`, one bin per tau bin recorded
    /// in the file's metadata.
    ///
    /// ## Errors
    ///
    /// * `FramesError::DimensionsError(IncorrectFrames)` - a frame
    /// number is `>= num_frames()`
    ///
    /// * `FramesError::FormatError` - the metadata has no tau bin count
    pub fn get_histogram(&self, frames : &[u64]) -> Result<Array1<u64>, SiffError> {
        self.check_frames_in_bounds(frames)?;
        let n_bins = self.num_flim_tau_bins()
            .ok_or_else(|| FramesError::FormatError(
                "No arrival time bins in file metadata".to_string()
            ))? as usize;

        let op = |local_frames : &[u64], histogram : &mut Array1<u64>, reader : &mut BufReader<File>|
        -> Result<(), FramesError> {
            local_frames.iter().try_for_each(|&frame| {
                load_histogram(&self._ifds[frame as usize], reader, &mut histogram.view_mut())
            })
        };

        let histogram = parallelize_op!(
            reduce FRAMES_PER_CHUNK,
            frames,
            self._filename,
            || Array1::<u64>::zeros(n_bins),
            op
        )?;
        Ok(histogram)
    }
}

impl Drop for SiffReader {
    fn drop(&mut self) {
        tracing::trace!(file = %self._filename.display(), "closing siff file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{FixtureFrame, SiffFixture, write_fixture};
    use crate::data::image::roll;

    #[test]
    fn open_forty_frames() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SiffFixture::forty_frames();
        let path = write_fixture(&dir, "open.siff", &fixture);

        let reader = SiffReader::open(&path).unwrap();
        assert_eq!(reader.num_frames(), 40);
        assert_eq!(reader.frames_vec(), (0..40).collect::<Vec<u64>>());
        assert_eq!(
            reader.image_dims(),
            Some(Dimensions::new(fixture.xdim as u64, fixture.ydim as u64))
        );
        assert_eq!(reader.num_flim_tau_bins(), Some(fixture.tau_bins));
        assert_eq!(reader.filename(), path.as_path());
    }

    #[test]
    fn read_all_forty_frames() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SiffFixture::forty_frames();
        let path = write_fixture(&dir, "frames.siff", &fixture);
        let reader = SiffReader::open(&path).unwrap();

        let frames = reader.get_frames_intensity(&reader.frames_vec(), None).unwrap();
        assert_eq!(frames.shape(), &[40, fixture.ydim as usize, fixture.xdim as usize]);
        for (frame, image) in frames.axis_iter(Axis(0)).enumerate() {
            assert_eq!(image, fixture.expected_intensity(frame));
        }

        // Out of order and repeated frames come back in the order asked for
        let frames = reader.get_frames_intensity(&[7, 2, 7], None).unwrap();
        assert_eq!(frames.index_axis(Axis(0), 0), fixture.expected_intensity(7));
        assert_eq!(frames.index_axis(Axis(0), 1), fixture.expected_intensity(2));
        assert_eq!(frames.index_axis(Axis(0), 2), fixture.expected_intensity(7));

        let empty = reader.get_frames_intensity(&[], None).unwrap();
        assert_eq!(empty.shape()[0], 0);
    }

    #[test]
    fn out_of_bounds_frames_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(&dir, "bounds.siff", &SiffFixture::forty_frames());
        let reader = SiffReader::open(&path).unwrap();

        assert!(matches!(
            reader.get_frames_intensity(&[0, 40], None),
            Err(SiffError::FramesError(FramesError::DimensionsError(DimensionsError::IncorrectFrames)))
        ));
        assert!(matches!(
            reader.get_histogram(&[40]),
            Err(SiffError::FramesError(FramesError::DimensionsError(DimensionsError::IncorrectFrames)))
        ));
        assert!(reader.get_frames_intensity(&(0..40).collect::<Vec<_>>(), None).is_ok());
    }

    #[test]
    fn registration() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SiffFixture::forty_frames();
        let path = write_fixture(&dir, "registration.siff", &fixture);
        let reader = SiffReader::open(&path).unwrap();

        let frames : Vec<u64> = (0..10).collect();
        let mut reg = RegistrationDict::new();
        frames.iter().for_each(|&x| {
            reg.insert(x, ((x % 3) as i32, -((x % 5) as i32)));
        });

        let registered = reader.get_frames_intensity(&frames, Some(&reg)).unwrap();
        for &frame in frames.iter() {
            assert_eq!(
                registered.index_axis(Axis(0), frame as usize),
                roll(&fixture.expected_intensity(frame as usize).view(), reg[&frame])
            );
        }

        reg.remove(&4);
        assert!(matches!(
            reader.get_frames_intensity(&frames, Some(&reg)),
            Err(SiffError::FramesError(FramesError::RegistrationFramesMissing))
        ));
    }

    #[test]
    fn histogram_over_all_frames() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SiffFixture::forty_frames();
        let path = write_fixture(&dir, "all_hist.siff", &fixture);
        let reader = SiffReader::open(&path).unwrap();

        let frames = reader.frames_vec();
        let histogram = reader.get_histogram(&frames).unwrap();
        assert_eq!(histogram.len(), fixture.tau_bins as usize);
        assert_eq!(histogram, fixture.expected_histogram(&frames));
    }

    #[test]
    fn histogram_needs_tau_bins() {
        let dir = tempfile::tempdir().unwrap();
        let mut fixture = SiffFixture::forty_frames();
        fixture.nvfd_tau_bins = false;
        let path = write_fixture(&dir, "no_bins.siff", &fixture);
        let reader = SiffReader::open(&path).unwrap();

        assert!(reader.num_flim_tau_bins().is_none());
        assert!(matches!(
            reader.get_histogram(&[0]),
            Err(SiffError::FramesError(FramesError::FormatError(_)))
        ));
    }

    #[test]
    fn inconsistent_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let mut fixture = SiffFixture::forty_frames();
        fixture.frames.truncate(4);
        fixture.frames[3] = FixtureFrame::generate(3, 4, 4, fixture.tau_bins, true);
        let path = write_fixture(&dir, "mixed.siff", &fixture);
        let reader = SiffReader::open(&path).unwrap();

        assert!(reader.image_dims().is_none());
        assert!(reader.get_frames_intensity(&[0, 1, 2], None).is_ok());
        assert_eq!(reader.get_frames_intensity(&[3], None).unwrap().shape(), &[1, 4, 4]);
        assert!(matches!(
            reader.get_frames_intensity(&[2, 3], None),
            Err(SiffError::FramesError(FramesError::DimensionsError(DimensionsError::NoConsistentDimensions)))
        ));
    }
}
