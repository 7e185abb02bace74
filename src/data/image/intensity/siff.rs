//! Intensity images out of `.siff` frames. Raw frames are
//! binned photon by photon, compressed frames already carry
//! their intensity image just ahead of the arrival-time strip.

use binrw::io::{Read, Seek};
use ndarray::prelude::*;

use crate::tiff::IFD;
use crate::utils::FramesError;
use crate::data::image::{
    dimensions::{macros::*, roll_inplace},
    utils::{load_array_from_siff, strip_byte_counts, frame_shape, read_photons, read_u16s},
};

/// Loads an allocated array with data read from a raw
/// `.siff` format frame (presumes the `reader` argument already
/// points to the frame) by ADDING data!
///
/// # Arguments
///
/// * `array` - The array to load the data into viewed as a 2d array
/// * `strip_bytes` - The number of bytes in the strip
/// * `ydim` - The height of the frame
/// * `xdim` - The width of the frame
/// * `registration` - A tuple of the pixelwise shifts, (y,x)
#[binrw::parser(reader)]
fn load_array_raw_siff(
    array : &mut ArrayViewMut2<u16>,
    strip_bytes : u64,
    ydim : u32,
    xdim : u32,
    registration : (i32, i32),
    ) -> binrw::BinResult<()> {

    read_photons(reader, strip_bytes)?.iter().for_each(|siffphoton : &u64| {
        let pixel = &mut array[[
            photon_to_y!(siffphoton, registration.0, ydim),
            photon_to_x!(siffphoton, registration.1, xdim),
        ]];
        *pixel = pixel.saturating_add(1);
    });
    Ok(())
}

/// Parses a compressed `.siff` format frame into `array`.
///
/// Expected to be at the data strip, so it will go backwards by the size of the
/// intensity data and read that.
#[binrw::parser(reader)]
fn load_array_compressed_siff(
    array : &mut ArrayViewMut2<u16>,
    ydim : u32,
    xdim : u32,
    registration : (i32, i32),
    ) -> binrw::BinResult<()> {

    let n_pixels = ydim as usize * xdim as usize;
    reader.seek(std::io::SeekFrom::Current(
        -((n_pixels * std::mem::size_of::<u16>()) as i64)
    ))?;

    let data = read_u16s(reader, n_pixels)?;
    let unregistered = ArrayView2::from_shape((ydim as usize, xdim as usize), &data)
        .map_err(|err| binrw::Error::Io(
            std::io::Error::new(std::io::ErrorKind::InvalidData, err)
        ))?;

    array.assign(&unregistered);
    roll_inplace(array, registration);
    Ok(())
}

/// Loads an allocated array with data read directly
/// from a `.siff` file. Will NOT change the `Seek`
/// location of the reader.
///
/// ## Arguments
///
/// * `reader` - Any reader of a `.siff` file
///
/// * `ifd` - The IFD of the frame to load into
///
/// * `array` - The array to load the data into viewed as a 2d array
///
/// ## Example
///
/// ```rust, ignore
/// use ndarray::prelude::*;
/// use std::fs::File;
///
/// let mut array = Array2::<u16>::zeros((512, 512));
/// let mut reader = File::open("file.siff").unwrap();
///
/// load_array(&mut reader, &ifd, &mut array.view_mut());
/// ```
///
/// ## See also
///
/// * `load_array_registered` - for loading an array
/// and shifting the data based on registration.
pub fn load_array<R, I>(
    reader : &mut R,
    ifd : &I,
    array : &mut ArrayViewMut2<u16>,
    ) -> Result<(), FramesError> where I : IFD, R : Read + Seek {
    load_array_registered(reader, ifd, array, (0, 0))
}

/// Loads an allocated array with data read directly
/// from a `.siff` file. Will NOT change the `Seek`
/// location of the reader.
///
/// # Arguments
///
/// * `reader` - Any reader of a `.siff` file
///
/// * `ifd` - The IFD of the frame to load into
/// the array
///
/// * `array` - The array to load the data into viewed as a 2d array
/// whose pixels will be filled with the intensity data
///
/// * `registration` - A tuple of the pixelwise shifts
/// to register the frame. The first element is the
/// shift in the y direction, and the second element
/// is the shift in the x direction. The shifts are
/// in the direct of the shift itself, i.e. a positive
/// registration in the y direction will shift the frame down.
pub fn load_array_registered<R, I>(
    reader : &mut R,
    ifd : &I,
    array : &mut ArrayViewMut2<u16>,
    registration : (i32, i32),
    ) -> Result<(), FramesError> where I : IFD, R : Read + Seek {
    let (ydim, xdim) = frame_shape(ifd)?;
    let strip_bytes = strip_byte_counts(ifd)?;
    load_array_from_siff!(
        reader,
        ifd,
        (load_array_raw_siff, (array, strip_bytes, ydim, xdim, registration)),
        (load_array_compressed_siff, (array, ydim, xdim, registration))
    )
}
