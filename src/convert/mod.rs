//! Traits for converting data.

pub mod from_mx;
pub mod into_mx;
