//! `FileFormat` holds everything read from the start of the
//! file before the first IFD: byte order, whether the file is
//! `BigTiff`, and the ScanImage static metadata strings.

use binrw::{
    io::{Read, Seek, SeekFrom},
    BinReaderExt,
};

use crate::tiff::ifd::{BigTiffIFD, TiffIFD, IFDIterator};
use crate::utils::FramesError;

/// Stored directly after the `BigTiff` header in files
/// written by ScanImage.
const SCANIMAGE_MAGIC : u32 = 117637889;

/// The NVFD line carrying the number of arrival-time bins
const TAU_BINS_KEY : &str = "SI.hScan2D.flimTauBins";

const TIFF_VERSION : u16 = 42;
const BIGTIFF_VERSION : u16 = 43;

#[derive(Debug, Clone, PartialEq)]
pub struct FileFormat {
    pub bigtiff : bool,
    first_ifd : u64,
    /// Non-varying frame data
    pub nvfd : String,
    pub roi_string : String,
}

impl FileFormat {
    /// Reads the header of the file pointed to by `reader`
    /// (from the beginning, regardless of where `reader` is)
    /// and returns a `FileFormat` describing it.
    ///
    /// ## Errors
    ///
    /// * `FramesError::FormatError` - if the file is big-endian,
    /// doesn't start with a tiff byte order mark, or has an
    /// unknown version number
    ///
    /// * `FramesError::IOError` - if the header can't be read
    ///
    /// ## Example
    ///
    /// ```rust, ignore
    /// let mut f = File::open("file.siff").unwrap();
    /// let file_format = FileFormat::parse_filetype(&mut f).unwrap();
    /// let ifds = file_format.get_ifd_vec(&mut f).unwrap();
    /// ```
    pub fn parse_filetype<R : Read + Seek>(reader : &mut R) -> Result<Self, FramesError> {
        reader.seek(SeekFrom::Start(0))?;

        let mut byte_order = [0u8; 2];
        reader.read_exact(&mut byte_order)?;
        match &byte_order {
            b"II" => {},
            b"MM" => return Err(FramesError::FormatError(
                "Big-endian files are not supported".to_string()
            )),
            _ => return Err(FramesError::FormatError(
                "File does not start with a tiff byte order mark".to_string()
            )),
        }

        let version : u16 = reader.read_le()?;
        match version {
            BIGTIFF_VERSION => {
                let bytesize : u16 = reader.read_le()?;
                let _reserved : u16 = reader.read_le()?;
                if bytesize != 8 {
                    return Err(FramesError::FormatError(
                        format!("Unexpected BigTiff offset size {}", bytesize)
                    ));
                }
                let first_ifd : u64 = reader.read_le()?;
                let (nvfd, roi_string) = read_scanimage_metadata(reader)?;
                Ok(FileFormat { bigtiff : true, first_ifd, nvfd, roi_string })
            },
            TIFF_VERSION => {
                let first_ifd : u32 = reader.read_le()?;
                Ok(FileFormat {
                    bigtiff : false,
                    first_ifd : first_ifd as u64,
                    nvfd : String::new(),
                    roi_string : String::new(),
                })
            },
            other => Err(FramesError::FormatError(
                format!("Unknown tiff version {}", other)
            )),
        }
    }

    /// Reads every IFD in the file, widening classic `Tiff`
    /// IFDs so the result is always `BigTiffIFD`s.
    pub fn get_ifd_vec<R : Read + Seek>(&self, reader : &mut R) -> Result<Vec<BigTiffIFD>, FramesError> {
        let ifds = if self.bigtiff {
            IFDIterator::<R, BigTiffIFD>::new(reader, self.first_ifd)
                .collect::<binrw::BinResult<Vec<_>>>()?
        } else {
            IFDIterator::<R, TiffIFD>::new(reader, self.first_ifd)
                .map(|ifd| ifd.map(BigTiffIFD::from))
                .collect::<binrw::BinResult<Vec<_>>>()?
        };
        Ok(ifds)
    }

    /// The number of arrival-time bins each photon's
    /// tau is histogrammed into, if the metadata says.
    pub fn num_flim_tau_bins(&self) -> Option<u32> {
        self.nvfd.lines().find_map(|line| {
            let (key, value) = line.split_once('=')?;
            if key.trim() != TAU_BINS_KEY {
                return None;
            }
            value.trim().parse::<u32>().ok()
        })
    }
}

/// Reads the ScanImage static metadata block that follows
/// the `BigTiff` header. Files without it just have empty
/// metadata strings.
fn read_scanimage_metadata<R : Read + Seek>(reader : &mut R)
    -> Result<(String, String), FramesError> {
    let magic : u32 = match reader.read_le() {
        Ok(magic) => magic,
        Err(_) => return Ok((String::new(), String::new())),
    };
    if magic != SCANIMAGE_MAGIC {
        return Ok((String::new(), String::new()));
    }

    let _version : u32 = reader.read_le()?;
    let nvfd_len : u32 = reader.read_le()?;
    let roi_len : u32 = reader.read_le()?;

    let mut nvfd = vec![0u8; nvfd_len as usize];
    reader.read_exact(&mut nvfd)?;
    let mut roi = vec![0u8; roi_len as usize];
    reader.read_exact(&mut roi)?;

    Ok((
        String::from_utf8_lossy(&nvfd).trim_end_matches('\0').to_string(),
        String::from_utf8_lossy(&roi).trim_end_matches('\0').to_string(),
    ))
}
