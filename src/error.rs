//! Everything related to errors.

use std::{error::Error as StdErr, ffi::CString, sync::Arc};

use log::warn;
use mex_sys::mexWarnMsgIdAndTxt;
use thiserror::Error;

/// Alias that is used for most `Result`s in this crate.
pub type MexResult<T> = Result<T, Box<MexError>>;

/// Identifier of the warnings raised while parsing arguments.
pub const ARGUMENTS_WARNING: &str = "mexrs:arguments:warning";

/// Array handle errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrayError {
    #[error("the host failed to allocate an array")]
    Allocation,
    #[error("the array handle is empty")]
    NullHandle,
    #[error("index {index} is out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no field named {field}")]
    UnknownField { field: String },
    #[error("a borrowed array cannot be modified")]
    Ownership,
    #[error("expected {expected} array, found {found}")]
    TypeMismatch { expected: String, found: String },
}

/// Value conversion errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("cannot convert {class} array to {target}")]
    IncompatibleClass { class: String, target: String },
    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: String },
    #[error("{code:#x} is not a valid character")]
    InvalidCharacter { code: u32 },
    #[error("{target} cannot be stored as an array element")]
    NotAnElement { target: String },
    #[error("element {index} is undefined")]
    UndefinedElement { index: usize },
}

/// Session registry errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("no {type_name} instance with id {id}")]
    NotFound { id: isize, type_name: String },
    #[error("{type_name} instance {id} is already in use")]
    InUse { id: isize, type_name: String },
    #[error("session id is empty")]
    EmptyIdentity,
    #[error("session id must be {expected}, found {found}")]
    InvalidIdentity { expected: String, found: String },
}

/// Argument parsing errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("no signature defined")]
    NoSignature,
    #[error("{message}")]
    NoMatchingSignature { message: String },
    #[error("index {index} is out of range for {len} arguments")]
    InputIndex { index: usize, len: usize },
    #[error("unknown option {name}")]
    UnknownOption { name: String },
    #[error("too few output: {found} for {mandatory}")]
    TooFewOutputs { found: usize, mandatory: usize },
    #[error("too many output: {found} for {maximum}")]
    TooManyOutputs { found: usize, maximum: usize },
    #[error("output index out of range: {index}")]
    OutputIndex { index: usize },
}

/// Operation dispatch errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("no operation name given")]
    MissingOperation,
    #[error("operation name must be char, found {found}")]
    InvalidOperationName { found: String },
    #[error("invalid operation: {name}")]
    UnknownOperation { name: String },
    #[error("operation {name} panicked: {message}")]
    Panicked { name: String, message: String },
}

/// All different errors.
#[derive(Debug, Error, Clone)]
pub enum MexError {
    #[error("Other: {0}")]
    Other(Arc<dyn StdErr + 'static + Send + Sync>),
    #[error("Array error: {0}")]
    ArrayError(ArrayError),
    #[error("Conversion error: {0}")]
    ConversionError(ConversionError),
    #[error("Session error: {0}")]
    SessionError(SessionError),
    #[error("Argument error: {0}")]
    ArgumentError(ArgumentError),
    #[error("Dispatch error: {0}")]
    DispatchError(DispatchError),
}

impl MexError {
    /// Convert an arbitrary error to `MexError::Other`.
    #[inline]
    pub fn other<E: StdErr + 'static + Send + Sync>(reason: E) -> Self {
        MexError::Other(Arc::new(reason))
    }

    /// Convert an arbitrary error to `Err(MexError::Other)`.
    #[inline]
    pub fn other_error<T, E: StdErr + 'static + Send + Sync>(reason: E) -> Result<T, Self> {
        Err(Self::other(reason))
    }

    /// The machine-readable identifier reported to the host together with the message.
    pub fn identifier(&self) -> &'static str {
        match self {
            MexError::Other(_) => "mexrs:error",
            MexError::ArrayError(e) => match e {
                ArrayError::Allocation => "mexrs:allocation",
                ArrayError::NullHandle => "mexrs:nullHandle",
                ArrayError::IndexOutOfRange { .. } => "mexrs:indexOutOfRange",
                ArrayError::UnknownField { .. } => "mexrs:unknownField",
                ArrayError::Ownership => "mexrs:ownership",
                ArrayError::TypeMismatch { .. } => "mexrs:typeMismatch",
            },
            MexError::ConversionError(_) => "mexrs:conversion",
            MexError::SessionError(SessionError::NotFound { .. }) => "mexrs:session:notFound",
            MexError::SessionError(SessionError::InUse { .. }) => "mexrs:session:inUse",
            MexError::SessionError(_) => "mexrs:session:invalidType",
            MexError::ArgumentError(_) => "mexrs:arguments:error",
            MexError::DispatchError(_) => "mexrs:dispatch:argumentError",
        }
    }
}

macro_rules! impl_from {
    ($type:ident) => {
        impl From<$type> for MexError {
            #[inline]
            fn from(e: $type) -> Self {
                MexError::$type(e)
            }
        }

        impl From<$type> for Box<MexError> {
            #[inline]
            fn from(e: $type) -> Self {
                Box::new(MexError::from(e))
            }
        }
    };
}

impl_from!(ArrayError);
impl_from!(ConversionError);
impl_from!(SessionError);
impl_from!(ArgumentError);
impl_from!(DispatchError);

// Interior NUL bytes cannot cross the C boundary.
pub(crate) fn c_string(s: &str) -> CString {
    match CString::new(s) {
        Ok(s) => s,
        Err(e) => {
            let end = e.nul_position();
            let mut bytes = e.into_vec();
            bytes.truncate(end);
            CString::new(bytes).unwrap_or_default()
        }
    }
}

/// Raise a non-fatal warning in the host and log it.
pub(crate) fn warn_host(identifier: &str, message: &str) {
    warn!("{}: {}", identifier, message);
    let identifier = c_string(identifier);
    let message = c_string(message);
    unsafe { mexWarnMsgIdAndTxt(identifier.as_ptr(), message.as_ptr()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_follow_the_error_kind() {
        let not_found: Box<MexError> = SessionError::NotFound {
            id: 1,
            type_name: "Foo".into(),
        }
        .into();
        assert_eq!(not_found.identifier(), "mexrs:session:notFound");

        let empty: Box<MexError> = SessionError::EmptyIdentity.into();
        assert_eq!(empty.identifier(), "mexrs:session:invalidType");

        let unknown: Box<MexError> = DispatchError::UnknownOperation { name: "foo".into() }.into();
        assert_eq!(unknown.identifier(), "mexrs:dispatch:argumentError");
        assert_eq!(
            unknown.to_string(),
            "Dispatch error: invalid operation: foo"
        );
    }

    #[test]
    fn interior_nul_is_truncated() {
        assert_eq!(c_string("abc\0def").as_bytes(), b"abc");
        assert_eq!(c_string("abc").as_bytes(), b"abc");
    }
}
