pub mod siff;
