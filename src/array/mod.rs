//! Owned and borrowed host arrays.
//!
//! An [`MxArray`] wraps a single `mxArray` handle. A handle that was passed to an entry point by
//! the host is borrowed: it can be read, converted and viewed, but never modified or destroyed.
//! A handle allocated through this crate is owned: it's destroyed when the `MxArray` is dropped
//! unless ownership is given up with [`MxArray::release`], which is how values are returned to
//! the host.
//!
//! Element views returned by [`MxArray::cell`] and [`MxArray::field`] borrow the parent array, the
//! `'scope` lifetime ensures they can't outlive it.

use std::{
    ffi::{CStr, CString},
    fmt,
    marker::PhantomData,
    ptr::{null, NonNull},
};

use log::trace;
use mex_sys::{
    mwSize, mxArray, mxComplexity, mxCreateCellMatrix, mxCreateCharArray, mxCreateLogicalMatrix,
    mxCreateNumericMatrix, mxCreateStructMatrix, mxDestroyArray, mxDuplicateArray,
    mxGetClassID, mxGetDimensions, mxGetFieldNameByNumber, mxGetFieldNumber, mxGetM, mxGetN,
    mxGetNumberOfDimensions, mxGetNumberOfElements, mxGetNumberOfFields, mxIsComplex,
    mxGetEps, mxGetField, mxGetLogicals, mxIsFunctionHandle, mxIsInf, mxIsNaN, mxIsSparse,
};
use smallvec::SmallVec;

use crate::{
    convert::into_mx::IntoMx,
    error::{c_string, ArrayError, MexResult},
    types::{ClassId, TypeCategory},
};

pub mod access;

/// The dimensions of an array.
pub type Dimensions = SmallVec<[usize; 4]>;

#[derive(Copy, Clone, PartialEq, Eq)]
enum Handle {
    Empty,
    Owned(NonNull<mxArray>),
    Borrowed(NonNull<mxArray>),
}

/// A host array that is either owned or borrowed.
pub struct MxArray<'scope> {
    handle: Handle,
    _scope: PhantomData<&'scope mxArray>,
}

impl MxArray<'static> {
    /// Convert `value` to a new owned array.
    pub fn from_value<T: IntoMx + ?Sized>(value: &T) -> MexResult<Self> {
        value.into_mx()
    }

    /// Convert `value` to a new array and return the raw handle. The caller becomes responsible
    /// for the handle, typically by storing it in an output slot.
    pub fn to_raw<T: IntoMx + ?Sized>(value: &T) -> MexResult<*mut mxArray> {
        Self::from_value(value)?.release()
    }

    /// Allocate a `rows x cols` numeric array with the class of `T`. Complex types allocate a
    /// complex array. All elements are zero.
    pub fn numeric<T: IntoMx>(rows: usize, cols: usize) -> MexResult<Self> {
        match T::CATEGORY {
            TypeCategory::Numeric | TypeCategory::Complex => Self::with_elements(
                T::ELEMENT_CLASS,
                T::CATEGORY == TypeCategory::Complex,
                rows,
                cols,
            ),
            _ => Err(ArrayError::TypeMismatch {
                expected: "a numeric".into(),
                found: std::any::type_name::<T>().into(),
            })?,
        }
    }

    /// Allocate a `rows x cols` logical array. All elements are `false`.
    pub fn logical(rows: usize, cols: usize) -> MexResult<Self> {
        Self::with_elements(ClassId::Logical, false, rows, cols)
    }

    /// Allocate a `rows x cols` char array. All elements are `0`.
    pub fn char_array(rows: usize, cols: usize) -> MexResult<Self> {
        Self::with_elements(ClassId::Char, false, rows, cols)
    }

    /// Allocate a `rows x cols` cell array. All cells are empty.
    pub fn cell_matrix(rows: usize, cols: usize) -> MexResult<Self> {
        unsafe { Self::allocated(mxCreateCellMatrix(rows, cols)) }
    }

    /// Allocate a `rows x cols` struct array with the given fields. All fields are unset.
    pub fn structure(fields: &[&str], rows: usize, cols: usize) -> MexResult<Self> {
        let names: Vec<CString> = fields.iter().map(|f| c_string(f)).collect();
        let pointers: Vec<_> = names.iter().map(|n| n.as_ptr()).collect();
        unsafe {
            Self::allocated(mxCreateStructMatrix(
                rows,
                cols,
                pointers.len() as _,
                pointers.as_ptr(),
            ))
        }
    }

    pub(crate) fn with_elements(
        class: ClassId,
        complex: bool,
        rows: usize,
        cols: usize,
    ) -> MexResult<Self> {
        unsafe {
            let raw = match class {
                ClassId::Logical => mxCreateLogicalMatrix(rows, cols),
                ClassId::Char => mxCreateCharArray(2, [rows, cols].as_ptr()),
                class if class.is_numeric() => {
                    let complexity = if complex {
                        mxComplexity::mxCOMPLEX
                    } else {
                        mxComplexity::mxREAL
                    };
                    mxCreateNumericMatrix(rows, cols, class.into_raw(), complexity)
                }
                class => Err(ArrayError::TypeMismatch {
                    expected: "an element".into(),
                    found: class.name().into(),
                })?,
            };

            Self::allocated(raw)
        }
    }

    unsafe fn allocated(raw: *mut mxArray) -> MexResult<Self> {
        match NonNull::new(raw) {
            Some(ptr) => {
                trace!("allocated array {:?}", ptr);
                Ok(MxArray {
                    handle: Handle::Owned(ptr),
                    _scope: PhantomData,
                })
            }
            None => Err(ArrayError::Allocation)?,
        }
    }
}

impl<'scope> MxArray<'scope> {
    /// An empty array that owns nothing.
    pub const fn empty() -> Self {
        MxArray {
            handle: Handle::Empty,
            _scope: PhantomData,
        }
    }

    /// Wrap a handle without taking ownership. A null handle results in an empty array.
    ///
    /// Safety: `array` must be null or a valid handle that outlives `'scope`.
    pub unsafe fn borrowed(array: *const mxArray) -> Self {
        MxArray {
            handle: match NonNull::new(array as *mut mxArray) {
                Some(ptr) => Handle::Borrowed(ptr),
                None => Handle::Empty,
            },
            _scope: PhantomData,
        }
    }

    /// Wrap a handle and take ownership of it. A null handle results in an empty array.
    ///
    /// Safety: `array` must be null or a valid handle that isn't owned by anything else.
    pub unsafe fn from_owned(array: *mut mxArray) -> Self {
        MxArray {
            handle: match NonNull::new(array) {
                Some(ptr) => Handle::Owned(ptr),
                None => Handle::Empty,
            },
            _scope: PhantomData,
        }
    }

    /// A borrowed view of this array.
    pub fn view(&self) -> MxArray<'_> {
        unsafe { MxArray::borrowed(self.as_ptr()) }
    }

    /// Move the handle out of `self`, leaving it empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Give up the handle. Ownership of the returned handle is transferred to the caller. If
    /// `self` only borrows its handle a deep copy is returned instead. Afterwards `self` is empty.
    pub fn release(&mut self) -> MexResult<*mut mxArray> {
        let handle = std::mem::replace(&mut self.handle, Handle::Empty);
        match handle {
            Handle::Empty => Err(ArrayError::NullHandle)?,
            Handle::Owned(ptr) => Ok(ptr.as_ptr()),
            Handle::Borrowed(ptr) => {
                let copy = unsafe { mxDuplicateArray(ptr.as_ptr()) };
                if copy.is_null() {
                    Err(ArrayError::Allocation)?;
                }
                Ok(copy)
            }
        }
    }

    /// A deep copy of the array as a new raw handle owned by the caller.
    pub fn duplicate(&self) -> MexResult<*mut mxArray> {
        let ptr = self.raw()?;
        let copy = unsafe { mxDuplicateArray(ptr) };
        if copy.is_null() {
            Err(ArrayError::Allocation)?;
        }
        Ok(copy)
    }

    /// A deep copy of the array.
    pub fn try_clone(&self) -> MexResult<MxArray<'static>> {
        let copy = self.duplicate()?;
        unsafe { Ok(MxArray::from_owned(copy)) }
    }

    /// Destroy the handle if it's owned and leave `self` empty.
    pub fn reset(&mut self) {
        *self = MxArray::empty();
    }

    /// Destroy the current handle if it's owned and take ownership of `array`.
    ///
    /// Safety: see [`MxArray::from_owned`].
    pub unsafe fn reset_owned(&mut self, array: *mut mxArray) {
        *self = MxArray::from_owned(array);
    }

    /// Destroy the current handle if it's owned and borrow `array`.
    ///
    /// Safety: see [`MxArray::borrowed`].
    pub unsafe fn reset_borrowed(&mut self, array: *const mxArray) {
        *self = MxArray::borrowed(array);
    }

    /// The raw handle, null if `self` is empty. Ownership is not transferred.
    pub fn as_ptr(&self) -> *const mxArray {
        match self.handle {
            Handle::Empty => null(),
            Handle::Owned(ptr) | Handle::Borrowed(ptr) => ptr.as_ptr(),
        }
    }

    /// Returns `true` if `self` has no handle.
    pub fn is_null(&self) -> bool {
        self.handle == Handle::Empty
    }

    /// Returns `true` if `self` owns its handle.
    pub fn is_owner(&self) -> bool {
        matches!(self.handle, Handle::Owned(_))
    }

    pub(crate) fn raw(&self) -> MexResult<*mut mxArray> {
        match self.handle {
            Handle::Empty => Err(ArrayError::NullHandle)?,
            Handle::Owned(ptr) | Handle::Borrowed(ptr) => Ok(ptr.as_ptr()),
        }
    }

    pub(crate) fn raw_owned(&mut self) -> MexResult<*mut mxArray> {
        match self.handle {
            Handle::Empty => Err(ArrayError::NullHandle)?,
            Handle::Owned(ptr) => Ok(ptr.as_ptr()),
            Handle::Borrowed(_) => Err(ArrayError::Ownership)?,
        }
    }

    /// The class of the array, `Unknown` if `self` is empty.
    pub fn class_id(&self) -> ClassId {
        unsafe { ClassId::from_raw(mxGetClassID(self.as_ptr())) }
    }

    /// The name of the class of the array.
    pub fn class_name(&self) -> &'static str {
        self.class_id().name()
    }

    /// The total number of elements.
    pub fn size(&self) -> usize {
        unsafe { mxGetNumberOfElements(self.as_ptr()) }
    }

    /// The number of dimensions.
    pub fn rank(&self) -> usize {
        unsafe { mxGetNumberOfDimensions(self.as_ptr()) }
    }

    /// The size of each dimension.
    pub fn dimensions(&self) -> Dimensions {
        let rank = self.rank();
        if rank == 0 {
            return Dimensions::new();
        }

        unsafe {
            let dims: *const mwSize = mxGetDimensions(self.as_ptr());
            Dimensions::from_slice(std::slice::from_raw_parts(dims, rank))
        }
    }

    /// The size of the first dimension.
    pub fn rows(&self) -> usize {
        unsafe { mxGetM(self.as_ptr()) }
    }

    /// The product of the sizes of all dimensions except the first.
    pub fn cols(&self) -> usize {
        unsafe { mxGetN(self.as_ptr()) }
    }

    /// The number of fields of a struct array.
    pub fn field_count(&self) -> usize {
        unsafe { mxGetNumberOfFields(self.as_ptr()) as usize }
    }

    /// The name of field `index` of a struct array.
    pub fn field_name(&self, index: usize) -> Option<String> {
        unsafe {
            let name = mxGetFieldNameByNumber(self.as_ptr(), index as _);
            if name.is_null() {
                None
            } else {
                Some(CStr::from_ptr(name).to_string_lossy().into_owned())
            }
        }
    }

    /// The names of all fields of a struct array in order.
    pub fn field_names(&self) -> Vec<String> {
        (0..self.field_count())
            .filter_map(|i| self.field_name(i))
            .collect()
    }

    /// Returns `true` if `self` is a struct array with a field named `name`.
    pub fn has_field(&self, name: &str) -> bool {
        let name = c_string(name);
        unsafe { mxGetFieldNumber(self.as_ptr(), name.as_ptr()) >= 0 }
    }

    /// Returns `true` if field `name` of element `index` has been assigned.
    pub fn has_field_at(&self, name: &str, index: usize) -> bool {
        if index >= self.size() {
            return false;
        }

        let name = c_string(name);
        unsafe { !mxGetField(self.as_ptr(), index, name.as_ptr()).is_null() }
    }

    pub fn is_numeric(&self) -> bool {
        self.class_id().is_numeric()
    }

    pub fn is_char(&self) -> bool {
        self.class_id() == ClassId::Char
    }

    pub fn is_cell(&self) -> bool {
        self.class_id() == ClassId::Cell
    }

    pub fn is_struct(&self) -> bool {
        self.class_id() == ClassId::Struct
    }

    pub fn is_logical(&self) -> bool {
        self.class_id() == ClassId::Logical
    }

    pub fn is_complex(&self) -> bool {
        unsafe { mxIsComplex(self.as_ptr()) }
    }

    pub fn is_function(&self) -> bool {
        unsafe { mxIsFunctionHandle(self.as_ptr()) }
    }

    pub fn is_sparse(&self) -> bool {
        unsafe { mxIsSparse(self.as_ptr()) }
    }

    pub fn is_double(&self) -> bool {
        self.class_id() == ClassId::Double
    }

    pub fn is_single(&self) -> bool {
        self.class_id() == ClassId::Single
    }

    pub fn is_int8(&self) -> bool {
        self.class_id() == ClassId::Int8
    }

    pub fn is_uint8(&self) -> bool {
        self.class_id() == ClassId::UInt8
    }

    pub fn is_int16(&self) -> bool {
        self.class_id() == ClassId::Int16
    }

    pub fn is_uint16(&self) -> bool {
        self.class_id() == ClassId::UInt16
    }

    pub fn is_int32(&self) -> bool {
        self.class_id() == ClassId::Int32
    }

    pub fn is_uint32(&self) -> bool {
        self.class_id() == ClassId::UInt32
    }

    pub fn is_int64(&self) -> bool {
        self.class_id() == ClassId::Int64
    }

    pub fn is_uint64(&self) -> bool {
        self.class_id() == ClassId::UInt64
    }

    /// Returns `true` if the class of the array is called `name`.
    pub fn is_class(&self, name: &str) -> bool {
        !self.is_null() && self.class_name() == name
    }

    /// Returns `true` if the array has no elements. An empty handle is also empty.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if the array is `1 x N` or `N x 1`.
    pub fn is_vector(&self) -> bool {
        self.rank() == 2 && (self.rows() == 1 || self.cols() == 1)
    }

    /// Returns `true` for a logical array with one element.
    pub fn is_logical_scalar(&self) -> bool {
        self.is_logical() && self.size() == 1
    }

    /// Returns `true` for a logical array with one element that is `true`.
    pub fn is_logical_scalar_true(&self) -> bool {
        self.is_logical_scalar() && unsafe { *mxGetLogicals(self.as_ptr()) }
    }
}

impl MxArray<'_> {
    /// Returns `true` if `value` is NaN according to the host.
    pub fn is_nan(value: f64) -> bool {
        unsafe { mxIsNaN(value) }
    }

    /// Returns `true` if `value` is infinite according to the host.
    pub fn is_inf(value: f64) -> bool {
        unsafe { mxIsInf(value) }
    }

    /// The host's machine epsilon.
    pub fn eps() -> f64 {
        unsafe { mxGetEps() }
    }
}

impl Default for MxArray<'_> {
    fn default() -> Self {
        MxArray::empty()
    }
}

impl Drop for MxArray<'_> {
    fn drop(&mut self) {
        if let Handle::Owned(ptr) = self.handle {
            trace!("destroying array {:?}", ptr);
            unsafe { mxDestroyArray(ptr.as_ptr()) }
        }
    }
}

impl fmt::Debug for MxArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ownership = match self.handle {
            Handle::Empty => return f.write_str("MxArray(empty)"),
            Handle::Owned(_) => "owned",
            Handle::Borrowed(_) => "borrowed",
        };

        f.debug_struct("MxArray")
            .field("class", &self.class_id())
            .field("dimensions", &self.dimensions().as_slice())
            .field("ownership", &ownership)
            .finish()
    }
}
