//! Shared plumbing for every frame loader: where a frame's
//! data strip is, how it's stored, and reading it out in
//! properly aligned chunks.

use binrw::io::Read;

use crate::tiff::{
    IFD,
    Tag,
    TiffTagID::{StripOffsets, StripByteCounts, Siff},
};
use crate::utils::FramesError;

/// How the photon stream of a frame is stored, from the `Siff` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiffCompression {
    /// One `u64` per photon: y | x | tau
    Raw,
    /// An intensity image right before the strip, then
    /// one `u16` arrival time per photon.
    Compressed,
}

pub fn strip_offset<I : IFD>(ifd : &I) -> Result<u64, FramesError> {
    ifd.get_tag(StripOffsets)
        .map(|tag| tag.value().into())
        .ok_or_else(|| FramesError::FormatError("Strip offset not found".to_string()))
}

pub fn strip_byte_counts<I : IFD>(ifd : &I) -> Result<u64, FramesError> {
    ifd.get_tag(StripByteCounts)
        .map(|tag| tag.value().into())
        .ok_or_else(|| FramesError::FormatError("Strip byte counts not found".to_string()))
}

pub fn siff_compression<I : IFD>(ifd : &I) -> Result<SiffCompression, FramesError> {
    let value : u64 = ifd.get_tag(Siff)
        .ok_or_else(|| FramesError::FormatError("Siff tag not found".to_string()))?
        .value().into();
    match value {
        0 => Ok(SiffCompression::Raw),
        1 => Ok(SiffCompression::Compressed),
        other => Err(FramesError::FormatError(format!("Invalid Siff tag value {}", other))),
    }
}

/// Photon coordinates are 16 bits, so no frame can be wider or taller
const MAX_FRAME_SIDE : u64 = 1 << 16;

/// `(ydim, xdim)` of the frame, as the `u32`s the parsers take.
/// Zero or oversized sides are a format error.
pub fn frame_shape<I : IFD>(ifd : &I) -> Result<(u32, u32), FramesError> {
    match (ifd.height(), ifd.width()) {
        (Some(y), Some(x)) => Ok((checked_side(y)?, checked_side(x)?)),
        _ => Err(FramesError::FormatError("Frame dimensions not found".to_string())),
    }
}

fn checked_side(side : u64) -> Result<u32, FramesError> {
    if side == 0 || side > MAX_FRAME_SIDE {
        return Err(FramesError::FormatError(format!("Invalid frame dimension {}", side)));
    }
    u32::try_from(side)
        .map_err(|_| FramesError::FormatError(format!("Invalid frame dimension {}", side)))
}

/// Checks, once at open, that a frame's data lies inside a
/// file of `file_len` bytes and that its shape is usable.
/// Tags a frame doesn't have are left for the readers to
/// complain about.
pub fn check_frame_layout<I : IFD>(ifd : &I, file_len : u64) -> Result<(), FramesError> {
    let shape = match (ifd.height(), ifd.width()) {
        (Some(_), Some(_)) => Some(frame_shape(ifd)?),
        _ => None,
    };

    let (offset, byte_count) = match (strip_offset(ifd), strip_byte_counts(ifd)) {
        (Ok(offset), Ok(byte_count)) => (offset, byte_count),
        _ => return Ok(()),
    };
    match offset.checked_add(byte_count) {
        Some(end) if end <= file_len => {},
        _ => return Err(FramesError::FormatError(format!(
            "Strip of {} bytes at {} runs past the end of the file ({} bytes)",
            byte_count, offset, file_len
        ))),
    }

    if let (Ok(SiffCompression::Compressed), Some((ydim, xdim))) = (siff_compression(ifd), shape) {
        let image_bytes = ydim as u64 * xdim as u64 * std::mem::size_of::<u16>() as u64;
        if offset < image_bytes {
            return Err(FramesError::FormatError(format!(
                "Compressed frame at {} has no room for its {} byte intensity image",
                offset, image_bytes
            )));
        }
    }
    Ok(())
}

/// Reads `strip_bytes / 8` raw photons. Reads straight into
/// a `u64` buffer so the cast never has alignment trouble.
pub fn read_photons<R : Read>(reader : &mut R, strip_bytes : u64) -> std::io::Result<Vec<u64>> {
    let mut photons = zeroed_buffer::<u64>(strip_bytes / 8)?;
    reader.read_exact(bytemuck::cast_slice_mut(&mut photons))?;
    photons.iter_mut().for_each(|photon| *photon = u64::from_le(*photon));
    Ok(photons)
}

/// Reads `count` little-endian `u16`s. Compressed intensity
/// images and arrival-time streams are both stored this way.
pub fn read_u16s<R : Read>(reader : &mut R, count : usize) -> std::io::Result<Vec<u16>> {
    let mut values = zeroed_buffer::<u16>(count as u64)?;
    reader.read_exact(bytemuck::cast_slice_mut(&mut values))?;
    values.iter_mut().for_each(|value| *value = u16::from_le(*value));
    Ok(values)
}

/// A buffer of `count` zeros, or an `InvalidData` error if
/// `count` can't be allocated (a corrupt byte count).
fn zeroed_buffer<T : Copy + Default>(count : u64) -> std::io::Result<Vec<T>> {
    let invalid = || std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("Can't allocate {} values for a data strip", count),
    );
    let count = usize::try_from(count).map_err(|_| invalid())?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(count).map_err(|_| invalid())?;
    buffer.resize(count, T::default());
    Ok(buffer)
}

/// ```rust, ignore
/// load_array_from_siff!(
///     reader,
///     ifd,
///     (raw_func, (raw_args)),
///     (compressed_func, (compressed_args))
/// )
/// ```
///
/// Seeks to the data strip of the frame described by `ifd`, calls
/// the parser matching its `Siff` tag, then puts the reader back
/// where it was, even if parsing failed. Evaluates to
/// `Result<(), FramesError>`.
macro_rules! load_array_from_siff {
    (
        $reader : ident,
        $ifd : ident,
        ( $raw_func : ident, ($($raw_args : expr),+) ),
        ( $compressed_func : ident, ($($compressed_args : expr),+) )
    ) => {{
        use $crate::data::image::utils::{strip_offset, siff_compression, SiffCompression};
        (|| -> Result<(), $crate::utils::FramesError> {
            let pos = $reader.stream_position()?;
            let compression = siff_compression($ifd)?;
            $reader.seek(std::io::SeekFrom::Start(strip_offset($ifd)?))?;

            let parsed = match compression {
                SiffCompression::Raw => {
                    $raw_func($reader, binrw::Endian::Little, ( $($raw_args),+ , ))
                },
                SiffCompression::Compressed => {
                    $compressed_func($reader, binrw::Endian::Little, ( $($compressed_args),+ , ))
                },
            };

            $reader.seek(std::io::SeekFrom::Start(pos))?;
            parsed.map_err($crate::utils::FramesError::from)
        })()
    }}
}

pub (crate) use load_array_from_siff;
