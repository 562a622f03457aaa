//! mexrs marshals values between Rust and the array handles of a MEX host.
//!
//! A MEX binary is a shared library with a single entry point, `mexFunction`, that the host calls
//! with arrays of input and output handles. mexrs provides:
//!
//!  - [`MxArray`], an owned or borrowed handle with typed element access and conversions between
//!    host arrays and Rust values through the [`IntoMx`] and [`FromMx`] traits.
//!  - [`TypeCategory`], the classification that decides how a Rust type is laid out in an array.
//!  - [`Session`], a registry that keeps native objects alive between calls behind an integer
//!    identity.
//!  - [`Dispatcher`], which routes calls to named operations through one entry point and reports
//!    errors to the host.
//!  - [`InputArguments`] and [`OutputArguments`] to validate the arguments of an operation.
//!
//! The host API itself is provided by the `mex-sys` crate, which contains an in-process reference
//! host so binaries built with mexrs can be tested without the host application.
//!
//! # Features
//!
//!  - `prelude`: enable the [`prelude`] module. Enabled by default.
//!  - `registry`: define operations anywhere in a binary with [`mex_define!`] and export the entry
//!    point with [`mex_dispatch!`]. Enabled by default.
//!
//! # Example
//!
//! ```
//! use mexrs::prelude::*;
//!
//! struct Accumulator {
//!     total: f64,
//! }
//!
//! fn new(outputs: &mut Outputs, _: &[MxArray<'_>]) -> MexResult<()> {
//!     let id = Session::create(Accumulator { total: 0.0 });
//!     outputs.set_array(0, Session::<Accumulator>::encode_id(id)?)
//! }
//!
//! fn add(outputs: &mut Outputs, inputs: &[MxArray<'_>]) -> MexResult<()> {
//!     let args = InputArguments::new(inputs, 2, &[])?;
//!     let value: f64 = args.get_as(1)?;
//!     let total = Session::<Accumulator>::with_mut_from(&args.get(0)?, |acc| {
//!         acc.total += value;
//!         acc.total
//!     })?;
//!     outputs.set(0, &total)
//! }
//!
//! let dispatcher = Dispatcher::new().define("new", new).define("add", add);
//!
//! let mut outputs = Outputs::new(1);
//! dispatcher
//!     .run(&mut outputs, &[MxArray::from_value("new").unwrap()])
//!     .unwrap();
//! let id = outputs.get(0).unwrap().try_clone().unwrap();
//!
//! let inputs = [MxArray::from_value("add").unwrap(), id, MxArray::from_value(&2.5).unwrap()];
//! let mut outputs = Outputs::new(1);
//! dispatcher.run(&mut outputs, &inputs).unwrap();
//! assert_eq!(outputs.get(0).unwrap().to::<f64>().unwrap(), 2.5);
//! ```
//!
//! [`MxArray`]: crate::array::MxArray
//! [`IntoMx`]: crate::convert::into_mx::IntoMx
//! [`FromMx`]: crate::convert::from_mx::FromMx
//! [`TypeCategory`]: crate::types::TypeCategory
//! [`Session`]: crate::session::Session
//! [`Dispatcher`]: crate::dispatch::Dispatcher
//! [`InputArguments`]: crate::args::InputArguments
//! [`OutputArguments`]: crate::args::OutputArguments
//! [`prelude`]: crate::prelude

#![forbid(rustdoc::broken_intra_doc_links)]

pub mod args;
pub mod array;
pub mod convert;
pub mod dispatch;
pub mod error;
#[cfg(feature = "prelude")]
pub mod prelude;
pub mod session;
pub mod types;

pub use mex_sys;

#[doc(hidden)]
pub use once_cell;

#[cfg(feature = "registry")]
#[doc(hidden)]
pub use inventory;
