//! Code in this submodule deals strictly with attention to
//! image dimensions and the types of things that can go wrong
//! with `Dimensions`.
//!

use ndarray::prelude::*;

/// Lowest 32 bits are the tau coordinate
pub const SIFF_TAU_MASK : u64 = (1<<32) - 1;
/// Highest 16 bits are the y coordinate
pub const SIFF_YMASK : u64 = ((1<<63) | ((1<<63) - 1)) & !((1<<48)-1);
/// Bits 32-48 bits are the x coordinate
pub const SIFF_XMASK : u64 = ((1<<48)- 1) & !((1<<32)-1);

/// `Dimensions` is a simple struct that holds the dimensions
/// of a frame
///
/// `xdim` is the width of the frame
/// `ydim` is the height of the frame
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Dimensions {
    pub xdim : u64,
    pub ydim : u64
}

#[derive(Debug, Clone, PartialEq)]
pub enum DimensionsError {
    NoConsistentDimensions,
    IncorrectFrames,
}

impl Dimensions {
    pub fn new(xdim : u64, ydim : u64) -> Dimensions {
        Dimensions {
            xdim,
            ydim,
        }
    }
}

impl std::error::Error for DimensionsError {}

impl std::fmt::Display for DimensionsError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DimensionsError::NoConsistentDimensions => {
                write!(f, "Requested data did not have consistent dimensions.")
            },
            DimensionsError::IncorrectFrames => {
                write!(f, "Requested frames are out of bounds.")
            }
        }
    }
}

/// Shifts `index` by `shift` and wraps it back into `0..dim`
#[inline]
pub fn wrap_index(index : u64, shift : i32, dim : u32) -> usize {
    ((index as i64 + shift as i64).rem_euclid(dim as i64)) as usize
}

/// Returns a copy of `array` with every pixel moved by
/// `shift` = (y, x), wrapping around the edges. A positive
/// y shift moves the image down.
pub fn roll<T : Clone>(array : &ArrayView2<T>, shift : (i32, i32)) -> Array2<T> {
    let (ydim, xdim) = array.dim();
    let mut rolled = array.to_owned();
    array.indexed_iter().for_each(|((y, x), value)| {
        rolled[[
            wrap_index(y as u64, shift.0, ydim as u32),
            wrap_index(x as u64, shift.1, xdim as u32),
        ]] = value.clone();
    });
    rolled
}

/// `roll` but writes the shifted data back into `array`
pub fn roll_inplace<T : Clone>(array : &mut ArrayViewMut2<T>, shift : (i32, i32)) {
    if shift == (0, 0) {
        return;
    }
    let rolled = roll(&array.view(), shift);
    array.assign(&rolled);
}

pub mod macros {
    /// Parses a `u64` from a photon in a raw `.siff` read
    /// to the y coordinate of the photon, shifted by `shift`
    /// and wrapped into `0..ydim`.
    ///
    /// ```rust, ignore
    /// let y = photon_to_y!(photon, 0, ydim);
    /// ```
    macro_rules! photon_to_y {
        ($photon : expr, $shift : expr, $ydim : expr) => {
            $crate::data::image::dimensions::wrap_index(
                ($photon & $crate::data::image::dimensions::SIFF_YMASK) >> 48,
                $shift,
                $ydim,
            )
        };
    }

    /// Parses a `u64` from a photon in a raw `.siff` read
    /// to the x coordinate of the photon, shifted by `shift`
    /// and wrapped into `0..xdim`.
    macro_rules! photon_to_x {
        ($photon : expr, $shift : expr, $xdim : expr) => {
            $crate::data::image::dimensions::wrap_index(
                ($photon & $crate::data::image::dimensions::SIFF_XMASK) >> 32,
                $shift,
                $xdim,
            )
        };
    }

    /// The arrival time bin of a raw `.siff` photon
    macro_rules! photon_to_tau_USIZE {
        ($photon : expr) => {
            ($photon & $crate::data::image::dimensions::SIFF_TAU_MASK) as usize
        };
    }

    pub (crate) use photon_to_y;
    pub (crate) use photon_to_x;
    pub (crate) use photon_to_tau_USIZE;
}
