//! Parsing of the frame data streams that the IFDs point to.

pub mod image;
