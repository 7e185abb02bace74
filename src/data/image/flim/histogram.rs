use binrw::io::{Read, Seek};
use ndarray::prelude::*;

use crate::tiff::IFD;
use crate::utils::FramesError;
use crate::data::image::{
    dimensions::macros::*,
    utils::{load_array_from_siff, strip_byte_counts, read_photons, read_u16s},
};

/// Reads the arrival times of a compressed frame and uses them
/// to increment the counts of the histogram. Presumes
/// the reader already points to the start of the arrival data.
#[binrw::parser(reader)]
fn _load_histogram_compressed(
    histogram : &mut ArrayViewMut1<u64>,
    strip_byte_counts : u64,
    ) -> binrw::BinResult<()> {

    let n_bins = histogram.len();
    let arrivals = read_u16s(
        reader,
        (strip_byte_counts as usize) / std::mem::size_of::<u16>()
    )?;

    // Arrival times past the last bin happen when a laser sync
    // is missed, those photons are dropped
    arrivals.iter()
        .filter(|&&tau| (tau as usize) < n_bins)
        .for_each(|&tau| histogram[tau as usize] += 1);
    Ok(())
}

/// Presumes the reader is already at the start of the data
#[binrw::parser(reader)]
fn _load_histogram_uncompressed(
    histogram : &mut ArrayViewMut1<u64>,
    strip_byte_counts : u64,
    ) -> binrw::BinResult<()> {

    let n_bins = histogram.len();
    read_photons(reader, strip_byte_counts)?.iter()
        .map(|photon| photon_to_tau_USIZE!(photon))
        .filter(|&tau| tau < n_bins)
        .for_each(|tau| histogram[tau] += 1);
    Ok(())
}

/// Takes an existing array viewed in 1 dimension (presumed to be the tau dimension)
/// and ADDS the arrival times of the frame pointed to by the IFD.
///
/// Will NOT change the position of the reader.
///
/// ## Arguments
///
/// * `ifd` - The IFD pointing to the frame to load the histogram from
///
/// * `reader` - The reader with access to the data
///
/// * `histogram` - The array to load the histogram into (1d)
///
/// ## Example
///
/// ```rust, ignore
/// use ndarray::prelude::*;
/// use std::fs::File;
///
/// let mut f = File::open("file.siff").unwrap();
/// let file_format = FileFormat::parse_filetype(&mut f).unwrap();
/// let mut histogram = Array1::<u64>::zeros(file_format.num_flim_tau_bins().unwrap() as usize);
/// let ifds = file_format.get_ifd_vec(&mut f).unwrap();
///
/// for ifd in ifds.iter() {
///    load_histogram(ifd, &mut f, &mut histogram.view_mut()).unwrap();
/// }
/// ```
pub fn load_histogram<I, ReaderT>(
    ifd : &I,
    reader : &mut ReaderT,
    histogram : &mut ArrayViewMut1<u64>
    ) -> Result<(), FramesError> where I : IFD, ReaderT : Read + Seek {
    let strip_bytes = strip_byte_counts(ifd)?;
    load_array_from_siff!(
        reader,
        ifd,
        (_load_histogram_uncompressed, (histogram, strip_bytes)),
        (_load_histogram_compressed, (histogram, strip_bytes))
    )
}
