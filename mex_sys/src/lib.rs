//! The MEX C API surface used by mexrs.
//!
//! Every function in [`bindings`] carries the name and signature of its counterpart in the
//! host's extension API. The implementation in this crate is an in-process reference host:
//! arrays live on the Rust heap, the module lock and exit hook are tracked per thread, and fatal
//! errors unwind to the caller of [`host::call`]. Variadic entry points take a preformatted
//! message instead of a format string and arguments.

pub mod bindings;
pub mod host;
pub mod types;

mod storage;

pub use bindings::*;
pub use types::*;
