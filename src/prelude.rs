//! Reexports structs and traits you're likely to need.

pub use num_complex::Complex;

pub use crate::{
    args::{InputArguments, OutputArguments},
    array::MxArray,
    convert::{from_mx::FromMx, into_mx::IntoMx},
    dispatch::{Dispatcher, Operation, Outputs},
    error::{MexError, MexResult},
    session::Session,
    types::{ClassId, TypeCategory},
};
