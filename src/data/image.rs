//! `Image`
//! 
//! Contains the data needed for parsing file data streams
//! into image-relevant structures.

mod dimensions;
mod intensity;
mod flim;
mod utils;

pub (crate) use intensity::siff::load_array as load_array_intensity;
pub (crate) use intensity::siff::load_array_registered as load_array_intensity_registered;

pub (crate) use flim::histogram::load_histogram;

pub (crate) use utils::check_frame_layout;

pub use dimensions::{Dimensions, DimensionsError};

#[cfg(test)]
pub (crate) use dimensions::roll;
