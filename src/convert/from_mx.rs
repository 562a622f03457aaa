//! Convert host arrays to Rust data.
//!
//! Types that implement [`FromMx`] can be extracted from an [`MxArray`] with [`MxArray::to`],
//! [`MxArray::at`] and [`MxArray::at_field`]. Scalars can be read from numeric, logical and char
//! arrays of any class, the element is cast to the requested type with a range check. Sequences
//! can also be read from cell arrays, each cell is converted separately.
//!
//! Custom types implement `from_mx`, typically by reading the fields of a struct array:
//!
//! ```
//! use mexrs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl FromMx for Point {
//!     fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
//!         Ok(Point {
//!             x: array.at_field("x", 0)?,
//!             y: array.at_field("y", 0)?,
//!         })
//!     }
//! }
//!
//! let mut array = MxArray::structure(&["x", "y"], 1, 1).unwrap();
//! array.set_field("x", &1.0, 0).unwrap();
//! array.set_field("y", &2i32, 0).unwrap();
//! assert_eq!(array.to::<Point>().unwrap(), Point { x: 1.0, y: 2.0 });
//! ```
//!
//! [`MxArray`]: crate::array::MxArray
//! [`MxArray::to`]: crate::array::MxArray::to
//! [`MxArray::at`]: crate::array::MxArray::at
//! [`MxArray::at_field`]: crate::array::MxArray::at_field

use std::any::type_name;

use num_complex::Complex;

use crate::{
    array::MxArray,
    error::{ConversionError, MexResult},
    types::{ClassId, Sample, TypeCategory},
};

/// Trait implemented by types that can be extracted from a host array.
pub trait FromMx: Sized {
    /// The shape of array this type is read from.
    const CATEGORY: TypeCategory = TypeCategory::Record;

    /// Convert the contents of `array` to `Self`.
    fn from_mx(array: &MxArray<'_>) -> MexResult<Self>;

    #[doc(hidden)]
    fn from_sample(_sample: Sample) -> MexResult<Self> {
        Err(ConversionError::NotAnElement {
            target: type_name::<Self>().into(),
        })?
    }
}

fn has_elements(array: &MxArray<'_>) -> bool {
    let class = array.class_id();
    class.is_numeric() || class == ClassId::Logical || class == ClassId::Char
}

fn incompatible<T>(array: &MxArray<'_>) -> MexResult<T> {
    Err(ConversionError::IncompatibleClass {
        class: array.class_name().into(),
        target: type_name::<T>().into(),
    })?
}

fn scalar<T: FromMx>(array: &MxArray<'_>) -> MexResult<T> {
    array.raw()?;
    if array.is_cell() {
        array.at(0)
    } else if has_elements(array) {
        T::from_sample(array.sample(0)?)
    } else {
        incompatible(array)
    }
}

macro_rules! impl_from_mx {
    ($type:ty) => {
        impl FromMx for $type {
            const CATEGORY: TypeCategory = TypeCategory::Numeric;

            #[inline]
            fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
                scalar(array)
            }

            #[inline]
            fn from_sample(sample: Sample) -> MexResult<Self> {
                sample.cast_to()
            }
        }
    };
}

impl_from_mx!(f64);
impl_from_mx!(f32);
impl_from_mx!(i8);
impl_from_mx!(u8);
impl_from_mx!(i16);
impl_from_mx!(u16);
impl_from_mx!(i32);
impl_from_mx!(u32);
impl_from_mx!(i64);
impl_from_mx!(u64);
impl_from_mx!(isize);
impl_from_mx!(usize);

impl FromMx for bool {
    const CATEGORY: TypeCategory = TypeCategory::Logical;

    fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
        scalar(array)
    }

    fn from_sample(sample: Sample) -> MexResult<Self> {
        Ok(sample.truthy())
    }
}

impl FromMx for char {
    const CATEGORY: TypeCategory = TypeCategory::Character;

    fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
        scalar(array)
    }

    fn from_sample(sample: Sample) -> MexResult<Self> {
        let code = match sample {
            Sample::Char(unit) => unit as u32,
            other => other.cast_to::<u32>()?,
        };

        match char::from_u32(code) {
            Some(c) => Ok(c),
            None => Err(ConversionError::InvalidCharacter { code })?,
        }
    }
}

macro_rules! impl_from_mx_complex {
    ($type:ty) => {
        impl FromMx for Complex<$type> {
            const CATEGORY: TypeCategory = TypeCategory::Complex;

            fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
                scalar(array)
            }

            fn from_sample(sample: Sample) -> MexResult<Self> {
                let (re, im) = sample.parts();
                Ok(Complex::new(re.cast_to()?, im.cast_to()?))
            }
        }
    };
}

impl_from_mx_complex!(f64);
impl_from_mx_complex!(f32);

impl<T: FromMx> FromMx for Vec<T> {
    const CATEGORY: TypeCategory = T::CATEGORY.container();

    fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
        array.raw()?;
        if array.is_cell() || (T::CATEGORY.is_scalar() && has_elements(array)) {
            (0..array.size()).map(|i| array.at(i)).collect()
        } else {
            incompatible(array)
        }
    }
}

impl FromMx for String {
    const CATEGORY: TypeCategory = TypeCategory::CharacterContainer;

    fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
        let units = if array.is_char() {
            array.chars()?.to_vec()
        } else {
            Vec::<u16>::from_mx(array)?
        };

        let mut string = String::with_capacity(units.len());
        for c in char::decode_utf16(units) {
            match c {
                Ok(c) => string.push(c),
                Err(e) => Err(ConversionError::InvalidCharacter {
                    code: e.unpaired_surrogate() as u32,
                })?,
            }
        }

        Ok(string)
    }
}

impl FromMx for MxArray<'static> {
    fn from_mx(array: &MxArray<'_>) -> MexResult<Self> {
        array.try_clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_convert_between_classes() {
        let array = MxArray::from_value(&42u8).unwrap();
        assert_eq!(array.to::<f64>().unwrap(), 42.0);
        assert_eq!(array.to::<i64>().unwrap(), 42);
        assert!(array.to::<bool>().unwrap());

        let array = MxArray::from_value(&-1i32).unwrap();
        assert!(array.to::<u32>().is_err());
        assert_eq!(array.to::<i8>().unwrap(), -1);
    }

    #[test]
    fn complex_reads() {
        let array = MxArray::from_value(&Complex::new(3.0f64, 4.0)).unwrap();
        assert!((array.to::<f64>().unwrap() - 5.0).abs() < 1e-9);

        let array = MxArray::from_value(&2.5f32).unwrap();
        assert_eq!(array.to::<Complex<f64>>().unwrap(), Complex::new(2.5, 0.0));
    }

    #[test]
    fn sequences_accept_cells() {
        let mut cell = MxArray::cell_matrix(1, 2).unwrap();
        cell.set(0, &1.0f64).unwrap();
        cell.set(1, &2u8).unwrap();
        assert_eq!(cell.to::<Vec<i32>>().unwrap(), vec![1, 2]);

        let empty = MxArray::cell_matrix(1, 1).unwrap();
        assert!(empty.to::<Vec<i32>>().is_err());
    }

    #[test]
    fn invalid_strings_are_rejected() {
        let array = MxArray::from_value(&vec![0xD800u16]).unwrap();
        assert!(array.to::<String>().is_err());

        let array = MxArray::from_value(&vec![104u16, 105]).unwrap();
        assert_eq!(array.to::<String>().unwrap(), "hi");
    }

    #[test]
    fn empty_handles_are_errors() {
        let array = MxArray::empty();
        assert_eq!(
            array.to::<Vec<f64>>().unwrap_err().identifier(),
            "mexrs:nullHandle"
        );
        assert!(array.to::<f64>().is_err());
        assert!(array.to::<String>().is_err());
    }

    #[test]
    fn records_are_not_elements() {
        let array = MxArray::structure(&["a"], 1, 1).unwrap();
        assert!(array.to::<f64>().is_err());
        assert!(array.to::<Vec<f64>>().is_err());
    }
}
