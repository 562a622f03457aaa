//! Single elements of host arrays.
//!
//! Reading an element of a numeric, logical or char array produces a [`Sample`], the element
//! widened to the largest type of its kind. Conversions into native types start from a sample, so
//! the class of the array and the requested type can be chosen independently. The rules are:
//!
//! - integer and float samples are cast with range checks, floats are truncated toward zero;
//! - a complex sample read as a real number collapses to its magnitude;
//! - a char sample is sign-extended from 16 bits for signed targets (including floats) and
//!   zero-extended for unsigned targets;
//! - a logical sample is `0` or `1`.

use std::fmt;

use mex_sys::{
    mxArray, mxGetChars, mxGetClassID, mxGetData, mxGetImagData, mxGetLogicals, mxIsComplex,
};
use num_traits::{Bounded, NumCast, Zero};

use crate::{
    error::{ConversionError, MexResult},
    types::ClassId,
};

/// A single element of a host array.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sample {
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(f64, f64),
    Bool(bool),
    Char(u16),
}

impl Sample {
    /// Cast this sample to a primitive number. Returns `None` if the value doesn't fit.
    pub fn cast<N>(self) -> Option<N>
    where
        N: NumCast + Bounded + Zero + PartialOrd,
    {
        match self {
            Sample::Int(v) => N::from(v),
            Sample::UInt(v) => N::from(v),
            Sample::Float(v) => narrow(v),
            Sample::Complex(re, im) => narrow(re.hypot(im)),
            Sample::Bool(v) => N::from(v as u8),
            Sample::Char(c) => {
                if N::min_value() < N::zero() {
                    N::from(c as i16)
                } else {
                    N::from(c)
                }
            }
        }
    }

    /// Like [`Sample::cast`], but fails with a [`ConversionError`].
    pub fn cast_to<N>(self) -> MexResult<N>
    where
        N: NumCast + Bounded + Zero + PartialOrd,
    {
        match self.cast() {
            Some(n) => Ok(n),
            None => Err(ConversionError::OutOfRange {
                value: self.to_string(),
                target: std::any::type_name::<N>().into(),
            })?,
        }
    }

    /// Returns `true` if the sample is nonzero.
    pub fn truthy(self) -> bool {
        match self {
            Sample::Int(v) => v != 0,
            Sample::UInt(v) => v != 0,
            Sample::Float(v) => v != 0.0,
            Sample::Complex(re, im) => re != 0.0 || im != 0.0,
            Sample::Bool(v) => v,
            Sample::Char(c) => c != 0,
        }
    }

    /// The 16-bit character unit of this sample. Signed values are stored in two's complement,
    /// so the accepted range is `i16::MIN..=u16::MAX`. Returns `None` outside of it.
    pub fn char_unit(self) -> Option<u16> {
        let code = match self {
            Sample::Int(v) => v,
            Sample::UInt(v) => i64::try_from(v).ok()?,
            Sample::Float(v) => narrow::<i64>(v)?,
            Sample::Complex(re, im) => narrow::<i64>(re.hypot(im))?,
            Sample::Bool(v) => v as i64,
            Sample::Char(c) => return Some(c),
        };

        if (i16::MIN as i64..=u16::MAX as i64).contains(&code) {
            Some(code as u16)
        } else {
            None
        }
    }

    /// Split this sample into a real and an imaginary part. Non-complex samples have an
    /// imaginary part of exactly zero.
    pub fn parts(self) -> (Sample, Sample) {
        match self {
            Sample::Complex(re, im) => (Sample::Float(re), Sample::Float(im)),
            other => (other, Sample::Float(0.0)),
        }
    }
}

// Float to float casts saturate to infinity instead of failing.
fn narrow<N: NumCast>(v: f64) -> Option<N> {
    let n = N::from(v)?;
    match n.to_f64() {
        Some(w) if v.is_finite() && w.is_infinite() => None,
        _ => Some(n),
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Int(v) => write!(f, "{}", v),
            Sample::UInt(v) => write!(f, "{}", v),
            Sample::Float(v) => write!(f, "{}", v),
            Sample::Complex(re, im) => write!(f, "{}{:+}i", re, im),
            Sample::Bool(v) => write!(f, "{}", v),
            Sample::Char(c) => write!(f, "char {:#x}", c),
        }
    }
}

/// Read element `index` of `array`.
///
/// Safety: `array` must be a valid handle with more than `index` elements.
pub(crate) unsafe fn load(array: *const mxArray, index: usize) -> MexResult<Sample> {
    let class = ClassId::from_raw(mxGetClassID(array));
    let complex = mxIsComplex(array);

    macro_rules! read_element {
        ($ty:ty, $variant:ident) => {{
            let re = *(mxGetData(array) as *const $ty).add(index);
            if complex {
                let im = *(mxGetImagData(array) as *const $ty).add(index);
                Sample::Complex(re as f64, im as f64)
            } else {
                Sample::$variant(re.into())
            }
        }};
    }

    let sample = match class {
        ClassId::Double => read_element!(f64, Float),
        ClassId::Single => read_element!(f32, Float),
        ClassId::Int8 => read_element!(i8, Int),
        ClassId::UInt8 => read_element!(u8, UInt),
        ClassId::Int16 => read_element!(i16, Int),
        ClassId::UInt16 => read_element!(u16, UInt),
        ClassId::Int32 => read_element!(i32, Int),
        ClassId::UInt32 => read_element!(u32, UInt),
        ClassId::Int64 => read_element!(i64, Int),
        ClassId::UInt64 => read_element!(u64, UInt),
        ClassId::Logical => Sample::Bool(*mxGetLogicals(array).add(index)),
        ClassId::Char => Sample::Char(*mxGetChars(array).add(index)),
        class => Err(ConversionError::IncompatibleClass {
            class: class.name().into(),
            target: "an element".into(),
        })?,
    };

    Ok(sample)
}

/// Write `sample` to element `index` of `array`, casting it to the class of the array.
///
/// Safety: `array` must be a valid handle with more than `index` elements, and the caller must
/// own it.
pub(crate) unsafe fn store(array: *mut mxArray, index: usize, sample: Sample) -> MexResult<()> {
    let class = ClassId::from_raw(mxGetClassID(array));
    let complex = mxIsComplex(array);

    macro_rules! write_element {
        ($ty:ty) => {{
            if complex {
                let (re, im) = sample.parts();
                let re = re.cast_to::<$ty>()?;
                let im = im.cast_to::<$ty>()?;
                *(mxGetData(array) as *mut $ty).add(index) = re;
                *(mxGetImagData(array) as *mut $ty).add(index) = im;
            } else {
                *(mxGetData(array) as *mut $ty).add(index) = sample.cast_to::<$ty>()?;
            }
        }};
    }

    match class {
        ClassId::Double => write_element!(f64),
        ClassId::Single => write_element!(f32),
        ClassId::Int8 => write_element!(i8),
        ClassId::UInt8 => write_element!(u8),
        ClassId::Int16 => write_element!(i16),
        ClassId::UInt16 => write_element!(u16),
        ClassId::Int32 => write_element!(i32),
        ClassId::UInt32 => write_element!(u32),
        ClassId::Int64 => write_element!(i64),
        ClassId::UInt64 => write_element!(u64),
        ClassId::Logical => *mxGetLogicals(array).add(index) = sample.truthy(),
        ClassId::Char => match sample.char_unit() {
            Some(unit) => *mxGetChars(array).add(index) = unit,
            None => Err(ConversionError::OutOfRange {
                value: sample.to_string(),
                target: class.name().into(),
            })?,
        },
        class => Err(ConversionError::IncompatibleClass {
            class: class.name().into(),
            target: "an element".into(),
        })?,
    }

    Ok(())
}
