//! Tags are the (id, type, count, value) entries of an IFD.
//! Only the handful of tags the reader actually consults get
//! their own `TiffTagID` variant, everything else ScanImage writes
//! is kept around as `TiffTagID::Other` so the IFD still parses.

use std::fmt::Debug;
use binrw::BinRead;

/// The tag ids used when reading `.siff` files. `Siff`
/// is the custom tag marking whether a frame's photon
/// stream was stored compressed (1) or raw (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffTagID {
    ImageWidth,
    ImageLength,
    BitsPerSample,
    Compression,
    PhotometricInterpretation,
    ImageDescription,
    StripOffsets,
    Orientation,
    SamplesPerPixel,
    RowsPerStrip,
    StripByteCounts,
    XResolution,
    YResolution,
    PlanarConfiguration,
    ResolutionUnit,
    Software,
    Artist,
    SampleFormat,
    Siff,
    Other(u16),
}

impl From<u16> for TiffTagID {
    fn from(code : u16) -> Self {
        match code {
            256 => TiffTagID::ImageWidth,
            257 => TiffTagID::ImageLength,
            258 => TiffTagID::BitsPerSample,
            259 => TiffTagID::Compression,
            262 => TiffTagID::PhotometricInterpretation,
            270 => TiffTagID::ImageDescription,
            273 => TiffTagID::StripOffsets,
            274 => TiffTagID::Orientation,
            277 => TiffTagID::SamplesPerPixel,
            278 => TiffTagID::RowsPerStrip,
            279 => TiffTagID::StripByteCounts,
            282 => TiffTagID::XResolution,
            283 => TiffTagID::YResolution,
            284 => TiffTagID::PlanarConfiguration,
            296 => TiffTagID::ResolutionUnit,
            305 => TiffTagID::Software,
            315 => TiffTagID::Artist,
            339 => TiffTagID::SampleFormat,
            907 => TiffTagID::Siff,
            other => TiffTagID::Other(other),
        }
    }
}

/// Shared behavior of the 12-byte `Tiff` entries and
/// the 20-byte `BigTiff` entries.
pub trait Tag : Debug {
    type ValueType : Into<u64> + Copy;

    /// The value stored inline in the entry. For every
    /// tag the reader uses this is the value itself, not
    /// an offset to it.
    fn value(&self) -> Self::ValueType;
}

#[derive(BinRead, Debug, Clone, Copy)]
#[br(little)]
pub struct TiffTag {
    #[br(map = |code : u16| TiffTagID::from(code))]
    pub tag : TiffTagID,
    pub tag_dtype : u16,
    pub num_values : u32,
    pub value : u32,
}

#[derive(BinRead, Debug, Clone, Copy)]
#[br(little)]
pub struct BigTag {
    #[br(map = |code : u16| TiffTagID::from(code))]
    pub tag : TiffTagID,
    pub tag_dtype : u16,
    pub num_values : u64,
    pub value : u64,
}

impl Tag for TiffTag {
    type ValueType = u32;
    fn value(&self) -> u32 { self.value }
}

impl Tag for BigTag {
    type ValueType = u64;
    fn value(&self) -> u64 { self.value }
}

impl From<TiffTag> for BigTag {
    fn from(tag : TiffTag) -> Self {
        BigTag {
            tag : tag.tag,
            tag_dtype : tag.tag_dtype,
            num_values : tag.num_values as u64,
            value : tag.value as u64,
        }
    }
}
