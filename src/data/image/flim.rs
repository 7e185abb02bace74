//! Arrival-time (FLIM) data. Only the photon arrival histogram
//! is read out of the tau dimension here.

pub mod histogram;
