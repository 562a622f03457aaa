//! Read and write the contents of an array.
//!
//! Elements are addressed with a linear, column-major index or with one subscript per dimension.
//! Reads never modify the array. Writes require that the array is owned; writing a cell or field
//! destroys the handle that previously occupied the slot.

use mex_sys::{
    mxAddField, mxCalcSingleSubscript, mxDestroyArray, mxGetCell, mxGetChars, mxGetData,
    mxGetField, mxGetFieldByNumber, mxGetFieldNumber, mxGetImagData, mxGetLogicals, mxSetCell,
    mxSetFieldByNumber,
};

use super::MxArray;
use crate::{
    convert::{from_mx::FromMx, into_mx::IntoMx},
    error::{c_string, ArrayError, ConversionError, MexResult},
    types::{
        sample::{self, Sample},
        ClassId, Primitive,
    },
};

impl<'scope> MxArray<'scope> {
    /// Convert the contents of the array to `T`.
    pub fn to<T: FromMx>(&self) -> MexResult<T> {
        T::from_mx(self)
    }

    /// Convert the contents of the array to `T` and store the result in `value`. `value` is
    /// unchanged if the conversion fails.
    pub fn to_into<T: FromMx>(&self, value: &mut T) -> MexResult<()> {
        *value = T::from_mx(self)?;
        Ok(())
    }

    /// Read element `index` as `T`.
    ///
    /// Elements of numeric, logical and char arrays can be read as any scalar type; the contents
    /// of a cell can be read as any type.
    pub fn at<T: FromMx>(&self, index: usize) -> MexResult<T> {
        let raw = self.raw()?;
        self.check_index(index)?;

        if self.is_cell() {
            let cell = unsafe { mxGetCell(raw, index) };
            if cell.is_null() {
                Err(ConversionError::UndefinedElement { index })?;
            }

            let element = unsafe { MxArray::borrowed(cell) };
            T::from_mx(&element)
        } else if T::CATEGORY.is_scalar() {
            T::from_sample(self.sample(index)?)
        } else {
            Err(ArrayError::TypeMismatch {
                expected: "a cell".into(),
                found: self.class_name().into(),
            })?
        }
    }

    /// Read field `field` of element `index` of a struct array as `T`.
    pub fn at_field<T: FromMx>(&self, field: &str, index: usize) -> MexResult<T> {
        match self.field(field, index)? {
            Some(value) => T::from_mx(&value),
            None if self.has_field(field) => Err(ConversionError::UndefinedElement { index })?,
            None => Err(ArrayError::UnknownField {
                field: field.into(),
            })?,
        }
    }

    /// A view of cell `index`, `None` if that cell is empty.
    pub fn cell(&self, index: usize) -> MexResult<Option<MxArray<'_>>> {
        let raw = self.raw()?;
        self.expect_class(ClassId::Cell)?;
        self.check_index(index)?;

        unsafe {
            let cell = mxGetCell(raw, index);
            if cell.is_null() {
                Ok(None)
            } else {
                Ok(Some(MxArray::borrowed(cell)))
            }
        }
    }

    /// A view of field `field` of element `index` of a struct array. `None` is returned if the
    /// array has no such field or if the field is unset.
    pub fn field(&self, field: &str, index: usize) -> MexResult<Option<MxArray<'_>>> {
        let raw = self.raw()?;
        self.expect_class(ClassId::Struct)?;
        self.check_index(index)?;

        let name = c_string(field);
        unsafe {
            let value = mxGetField(raw, index, name.as_ptr());
            if value.is_null() {
                Ok(None)
            } else {
                Ok(Some(MxArray::borrowed(value)))
            }
        }
    }

    /// Write `value` to element `index`.
    ///
    /// If the array is a cell `value` is converted to a new array that replaces the contents of
    /// the cell, otherwise `value` must be a scalar that is cast to the class of the array.
    pub fn set<T: IntoMx + ?Sized>(&mut self, index: usize, value: &T) -> MexResult<()> {
        let raw = self.raw_owned()?;
        self.check_index(index)?;

        if self.is_cell() {
            let value = value.into_mx()?;
            self.set_cell(index, value)
        } else if T::CATEGORY.is_scalar() {
            unsafe { sample::store(raw, index, value.to_sample()?) }
        } else {
            Err(ArrayError::TypeMismatch {
                expected: "a cell".into(),
                found: self.class_name().into(),
            })?
        }
    }

    /// Replace the contents of cell `index` with `value`. If `value` is borrowed, a copy is
    /// stored.
    pub fn set_cell(&mut self, index: usize, mut value: MxArray<'_>) -> MexResult<()> {
        let raw = self.raw_owned()?;
        self.expect_class(ClassId::Cell)?;
        self.check_index(index)?;

        let value = value.release()?;
        unsafe {
            mxDestroyArray(mxGetCell(raw, index));
            mxSetCell(raw, index, value);
        }

        Ok(())
    }

    /// Write `value` to field `field` of element `index` of a struct array. The field is added
    /// if the array doesn't have it yet.
    pub fn set_field<T: IntoMx + ?Sized>(
        &mut self,
        field: &str,
        value: &T,
        index: usize,
    ) -> MexResult<()> {
        self.raw_owned()?;
        let value = value.into_mx()?;
        self.set_field_array(field, value, index)
    }

    /// Replace field `field` of element `index` of a struct array with `value`. The field is
    /// added if the array doesn't have it yet. If `value` is borrowed, a copy is stored.
    pub fn set_field_array(
        &mut self,
        field: &str,
        mut value: MxArray<'_>,
        index: usize,
    ) -> MexResult<()> {
        let raw = self.raw_owned()?;
        self.expect_class(ClassId::Struct)?;
        self.check_index(index)?;

        let value = value.release()?;
        let name = c_string(field);
        unsafe {
            let mut number = mxGetFieldNumber(raw, name.as_ptr());
            if number < 0 {
                number = mxAddField(raw, name.as_ptr());
                if number < 0 {
                    mxDestroyArray(value);
                    Err(ArrayError::Allocation)?;
                }
            }

            mxDestroyArray(mxGetFieldByNumber(raw, index, number));
            mxSetFieldByNumber(raw, index, number, value);
        }

        Ok(())
    }

    /// The linear index of the element at `subscripts`, one subscript per dimension. Missing
    /// trailing subscripts are zero.
    pub fn subscript_index(&self, subscripts: &[usize]) -> MexResult<usize> {
        let raw = self.raw()?;
        let dims = self.dimensions();

        for (k, &sub) in subscripts.iter().enumerate() {
            let len = dims.get(k).copied().unwrap_or(1);
            if sub >= len {
                Err(ArrayError::IndexOutOfRange { index: sub, len })?;
            }
        }

        unsafe {
            Ok(mxCalcSingleSubscript(
                raw,
                subscripts.len(),
                subscripts.as_ptr(),
            ))
        }
    }

    /// Read the element at `subscripts` as `T`.
    pub fn at_subscript<T: FromMx>(&self, subscripts: &[usize]) -> MexResult<T> {
        let index = self.subscript_index(subscripts)?;
        self.at(index)
    }

    /// Write `value` to the element at `subscripts`.
    pub fn set_subscript<T: IntoMx + ?Sized>(
        &mut self,
        subscripts: &[usize],
        value: &T,
    ) -> MexResult<()> {
        let index = self.subscript_index(subscripts)?;
        self.set(index, value)
    }

    /// The real data of a numeric array of class `T::CLASS`.
    pub fn as_slice<T: Primitive>(&self) -> MexResult<&[T]> {
        let raw = self.raw()?;
        self.expect_class(T::CLASS)?;
        unsafe { Ok(std::slice::from_raw_parts(mxGetData(raw) as *const T, self.size())) }
    }

    /// The real data of an owned numeric array of class `T::CLASS`.
    pub fn as_mut_slice<T: Primitive>(&mut self) -> MexResult<&mut [T]> {
        let raw = self.raw_owned()?;
        self.expect_class(T::CLASS)?;
        unsafe {
            Ok(std::slice::from_raw_parts_mut(
                mxGetData(raw) as *mut T,
                self.size(),
            ))
        }
    }

    /// The imaginary data of a complex array of class `T::CLASS`.
    pub fn imag_slice<T: Primitive>(&self) -> MexResult<&[T]> {
        let raw = self.raw()?;
        self.expect_class(T::CLASS)?;
        if !self.is_complex() {
            Err(ArrayError::TypeMismatch {
                expected: "a complex".into(),
                found: self.class_name().into(),
            })?;
        }

        unsafe {
            Ok(std::slice::from_raw_parts(
                mxGetImagData(raw) as *const T,
                self.size(),
            ))
        }
    }

    /// The UTF-16 code units of a char array.
    pub fn chars(&self) -> MexResult<&[u16]> {
        let raw = self.raw()?;
        self.expect_class(ClassId::Char)?;
        unsafe { Ok(std::slice::from_raw_parts(mxGetChars(raw), self.size())) }
    }

    /// The elements of a logical array.
    pub fn logicals(&self) -> MexResult<&[bool]> {
        let raw = self.raw()?;
        self.expect_class(ClassId::Logical)?;
        unsafe { Ok(std::slice::from_raw_parts(mxGetLogicals(raw), self.size())) }
    }

    /// Element `index` of a numeric, logical or char array.
    pub fn sample(&self, index: usize) -> MexResult<Sample> {
        let raw = self.raw()?;
        self.check_index(index)?;
        unsafe { sample::load(raw, index) }
    }

    pub(crate) fn check_index(&self, index: usize) -> MexResult<()> {
        let len = self.size();
        if index >= len {
            Err(ArrayError::IndexOutOfRange { index, len })?;
        }
        Ok(())
    }

    pub(crate) fn expect_class(&self, class: ClassId) -> MexResult<()> {
        let found = self.class_id();
        if found != class {
            Err(ArrayError::TypeMismatch {
                expected: format!("a {}", class.name()),
                found: found.name().into(),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_start_empty() {
        let mut cell = MxArray::cell_matrix(1, 3).unwrap();
        for i in 0..3 {
            assert!(cell.cell(i).unwrap().is_none());
        }

        cell.set(1, &5i32).unwrap();
        assert!(cell.cell(0).unwrap().is_none());
        assert!(cell.cell(1).unwrap().is_some());
        assert_eq!(cell.at::<i32>(1).unwrap(), 5);
        assert!(cell.cell(3).is_err());
    }

    #[test]
    fn borrowed_arrays_cannot_be_modified() {
        let owner = MxArray::numeric::<f64>(1, 2).unwrap();
        let mut view = owner.view();
        let err = view.set(0, &1.0).unwrap_err();
        assert_eq!(err.identifier(), "mexrs:ownership");
    }

    #[test]
    fn subscripts_are_range_checked() {
        let mut array = MxArray::numeric::<f64>(2, 3).unwrap();
        assert_eq!(array.subscript_index(&[1, 2]).unwrap(), 5);
        assert_eq!(array.subscript_index(&[1]).unwrap(), 1);
        assert!(array.subscript_index(&[2, 0]).is_err());
        assert!(array.subscript_index(&[0, 3]).is_err());

        array.set_subscript(&[1, 1], &7.0).unwrap();
        assert_eq!(array.at::<f64>(3).unwrap(), 7.0);
        assert_eq!(array.at_subscript::<i32>(&[1, 1]).unwrap(), 7);
    }

    #[test]
    fn slices_require_a_matching_class() {
        let mut array = MxArray::numeric::<u16>(1, 3).unwrap();
        array.as_mut_slice::<u16>().unwrap().copy_from_slice(&[1, 2, 3]);
        assert_eq!(array.as_slice::<u16>().unwrap(), &[1, 2, 3]);
        assert!(array.as_slice::<i16>().is_err());
        assert!(array.imag_slice::<u16>().is_err());
        assert!(array.chars().is_err());
    }
}
