//! Convert Rust data to host arrays.
//!
//! Any type that implements [`IntoMx`] can be converted to a new owned [`MxArray`] with
//! [`MxArray::from_value`], stored in a cell or struct field with [`MxArray::set`] and
//! [`MxArray::set_field`], or returned from an operation. The trait is implemented for all
//! primitive numbers, `bool`, `char`, complex numbers, strings, slices and vectors.
//!
//! Custom types implement `into_mx` and keep the default `Record` category. They're usually
//! converted to a struct array:
//!
//! ```
//! use mexrs::prelude::*;
//!
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl IntoMx for Point {
//!     fn into_mx(&self) -> MexResult<MxArray<'static>> {
//!         let mut array = MxArray::structure(&["x", "y"], 1, 1)?;
//!         array.set_field("x", &self.x, 0)?;
//!         array.set_field("y", &self.y, 0)?;
//!         Ok(array)
//!     }
//! }
//!
//! let points = vec![Point { x: 1.0, y: 2.0 }, Point { x: 3.0, y: 4.0 }];
//! let array = MxArray::from_value(&points).unwrap();
//! assert!(array.is_cell());
//! let second = array.cell(1).unwrap().unwrap();
//! assert_eq!(second.at_field::<f64>("y", 0).unwrap(), 4.0);
//! ```
//!
//! [`MxArray`]: crate::array::MxArray
//! [`MxArray::from_value`]: crate::array::MxArray::from_value
//! [`MxArray::set`]: crate::array::MxArray::set
//! [`MxArray::set_field`]: crate::array::MxArray::set_field

use std::any::type_name;

use mex_sys::mxGetChars;
use num_complex::Complex;

use crate::{
    array::MxArray,
    error::{ConversionError, MexResult},
    types::{
        sample::{self, Sample},
        ClassId, TypeCategory,
    },
};

/// Trait implemented by types that can be converted to a host array.
pub trait IntoMx {
    /// The shape of array this type is converted to.
    const CATEGORY: TypeCategory = TypeCategory::Record;

    #[doc(hidden)]
    const ELEMENT_CLASS: ClassId = ClassId::Unknown;

    /// Convert `self` to a new array.
    fn into_mx(&self) -> MexResult<MxArray<'static>>;

    #[doc(hidden)]
    fn to_sample(&self) -> MexResult<Sample> {
        Err(ConversionError::NotAnElement {
            target: type_name::<Self>().into(),
        })?
    }
}

fn scalar<T: IntoMx + ?Sized>(value: &T) -> MexResult<MxArray<'static>> {
    let complex = T::CATEGORY == TypeCategory::Complex;
    let mut array = MxArray::with_elements(T::ELEMENT_CLASS, complex, 1, 1)?;
    let raw = array.raw_owned()?;
    unsafe { sample::store(raw, 0, value.to_sample()?)? };
    Ok(array)
}

fn sequence<T: IntoMx>(values: &[T]) -> MexResult<MxArray<'static>> {
    if T::CATEGORY.is_scalar() {
        let complex = T::CATEGORY == TypeCategory::Complex;
        let mut array = MxArray::with_elements(T::ELEMENT_CLASS, complex, 1, values.len())?;
        let raw = array.raw_owned()?;
        for (i, value) in values.iter().enumerate() {
            unsafe { sample::store(raw, i, value.to_sample()?)? };
        }
        Ok(array)
    } else {
        let mut cell = MxArray::cell_matrix(1, values.len())?;
        for (i, value) in values.iter().enumerate() {
            cell.set_cell(i, value.into_mx()?)?;
        }
        Ok(cell)
    }
}

macro_rules! impl_into_mx {
    ($type:ty, $variant:ident, $wide:ty, $class:expr) => {
        impl IntoMx for $type {
            const CATEGORY: TypeCategory = TypeCategory::Numeric;
            const ELEMENT_CLASS: ClassId = $class;

            #[inline]
            fn into_mx(&self) -> MexResult<MxArray<'static>> {
                scalar(self)
            }

            #[inline]
            fn to_sample(&self) -> MexResult<Sample> {
                Ok(Sample::$variant(*self as $wide))
            }
        }
    };
}

impl_into_mx!(f64, Float, f64, ClassId::Double);
impl_into_mx!(f32, Float, f64, ClassId::Single);
impl_into_mx!(i8, Int, i64, ClassId::Int8);
impl_into_mx!(u8, UInt, u64, ClassId::UInt8);
impl_into_mx!(i16, Int, i64, ClassId::Int16);
impl_into_mx!(u16, UInt, u64, ClassId::UInt16);
impl_into_mx!(i32, Int, i64, ClassId::Int32);
impl_into_mx!(u32, UInt, u64, ClassId::UInt32);
impl_into_mx!(i64, Int, i64, ClassId::Int64);
impl_into_mx!(u64, UInt, u64, ClassId::UInt64);
impl_into_mx!(isize, Int, i64, ClassId::ISIZE);
impl_into_mx!(usize, UInt, u64, ClassId::USIZE);

impl IntoMx for bool {
    const CATEGORY: TypeCategory = TypeCategory::Logical;
    const ELEMENT_CLASS: ClassId = ClassId::Logical;

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        scalar(self)
    }

    fn to_sample(&self) -> MexResult<Sample> {
        Ok(Sample::Bool(*self))
    }
}

impl IntoMx for char {
    const CATEGORY: TypeCategory = TypeCategory::Character;
    const ELEMENT_CLASS: ClassId = ClassId::Char;

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        scalar(self)
    }

    fn to_sample(&self) -> MexResult<Sample> {
        let mut units = [0u16; 2];
        match self.encode_utf16(&mut units) {
            [unit] => Ok(Sample::Char(*unit)),
            _ => Err(ConversionError::InvalidCharacter { code: *self as u32 })?,
        }
    }
}

macro_rules! impl_into_mx_complex {
    ($type:ty, $class:expr) => {
        impl IntoMx for Complex<$type> {
            const CATEGORY: TypeCategory = TypeCategory::Complex;
            const ELEMENT_CLASS: ClassId = $class;

            fn into_mx(&self) -> MexResult<MxArray<'static>> {
                scalar(self)
            }

            fn to_sample(&self) -> MexResult<Sample> {
                Ok(Sample::Complex(self.re as f64, self.im as f64))
            }
        }
    };
}

impl_into_mx_complex!(f64, ClassId::Double);
impl_into_mx_complex!(f32, ClassId::Single);

impl<T: IntoMx> IntoMx for [T] {
    const CATEGORY: TypeCategory = T::CATEGORY.container();

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        sequence(self)
    }
}

impl<T: IntoMx, const N: usize> IntoMx for [T; N] {
    const CATEGORY: TypeCategory = T::CATEGORY.container();

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        sequence(self)
    }
}

impl<T: IntoMx> IntoMx for Vec<T> {
    const CATEGORY: TypeCategory = T::CATEGORY.container();

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        sequence(self)
    }
}

impl IntoMx for str {
    const CATEGORY: TypeCategory = TypeCategory::CharacterContainer;

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        let units: Vec<u16> = self.encode_utf16().collect();
        let mut array = MxArray::char_array(1, units.len())?;
        let raw = array.raw_owned()?;
        unsafe {
            std::ptr::copy_nonoverlapping(units.as_ptr(), mxGetChars(raw), units.len());
        }
        Ok(array)
    }
}

impl IntoMx for String {
    const CATEGORY: TypeCategory = TypeCategory::CharacterContainer;

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        self.as_str().into_mx()
    }
}

impl<T: IntoMx + ?Sized> IntoMx for &T {
    const CATEGORY: TypeCategory = T::CATEGORY;
    const ELEMENT_CLASS: ClassId = T::ELEMENT_CLASS;

    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        (**self).into_mx()
    }

    fn to_sample(&self) -> MexResult<Sample> {
        (**self).to_sample()
    }
}

impl IntoMx for MxArray<'_> {
    fn into_mx(&self) -> MexResult<MxArray<'static>> {
        self.try_clone()
    }
}
