use std::{ffi::CString, ptr::null_mut};

use crate::{
    host,
    types::{mxArray, mxClassID},
};

pub(crate) enum Data {
    // Backed by u64 words so every element type is aligned.
    Numeric {
        real: Vec<u64>,
        imag: Option<Vec<u64>>,
    },
    Char(Vec<u16>),
    Logical(Vec<bool>),
    Cell(Vec<*mut mxArray>),
    Struct {
        fields: Vec<CString>,
        values: Vec<*mut mxArray>,
    },
}

pub(crate) struct Array {
    pub(crate) class: mxClassID,
    pub(crate) dims: Vec<usize>,
    pub(crate) data: Data,
}

pub(crate) fn element_size(class: mxClassID) -> usize {
    match class {
        mxClassID::mxDOUBLE_CLASS | mxClassID::mxINT64_CLASS | mxClassID::mxUINT64_CLASS => 8,
        mxClassID::mxSINGLE_CLASS | mxClassID::mxINT32_CLASS | mxClassID::mxUINT32_CLASS => 4,
        mxClassID::mxINT16_CLASS | mxClassID::mxUINT16_CLASS | mxClassID::mxCHAR_CLASS => 2,
        mxClassID::mxINT8_CLASS | mxClassID::mxUINT8_CLASS | mxClassID::mxLOGICAL_CLASS => 1,
        _ => 0,
    }
}

pub(crate) fn is_numeric(class: mxClassID) -> bool {
    matches!(
        class,
        mxClassID::mxDOUBLE_CLASS
            | mxClassID::mxSINGLE_CLASS
            | mxClassID::mxINT8_CLASS
            | mxClassID::mxUINT8_CLASS
            | mxClassID::mxINT16_CLASS
            | mxClassID::mxUINT16_CLASS
            | mxClassID::mxINT32_CLASS
            | mxClassID::mxUINT32_CLASS
            | mxClassID::mxINT64_CLASS
            | mxClassID::mxUINT64_CLASS
    )
}

// At least two dimensions, no trailing singletons beyond the second.
fn normalize(dims: &[usize]) -> Vec<usize> {
    let mut dims = dims.to_vec();
    while dims.len() < 2 {
        dims.push(1);
    }
    while dims.len() > 2 && dims[dims.len() - 1] == 1 {
        dims.pop();
    }
    dims
}

fn words(len: usize, class: mxClassID) -> Vec<u64> {
    vec![0; (len * element_size(class) + 7) / 8]
}

impl Array {
    pub(crate) fn numeric(class: mxClassID, dims: &[usize], complex: bool) -> Option<Self> {
        if !is_numeric(class) {
            return None;
        }

        let dims = normalize(dims);
        let len = dims.iter().product();
        let real = words(len, class);
        let imag = if complex { Some(words(len, class)) } else { None };

        Some(Array {
            class,
            dims,
            data: Data::Numeric { real, imag },
        })
    }

    pub(crate) fn chars(dims: &[usize]) -> Self {
        let dims = normalize(dims);
        let len = dims.iter().product();
        Array {
            class: mxClassID::mxCHAR_CLASS,
            dims,
            data: Data::Char(vec![0; len]),
        }
    }

    pub(crate) fn logical(dims: &[usize]) -> Self {
        let dims = normalize(dims);
        let len = dims.iter().product();
        Array {
            class: mxClassID::mxLOGICAL_CLASS,
            dims,
            data: Data::Logical(vec![false; len]),
        }
    }

    pub(crate) fn cell(dims: &[usize]) -> Self {
        let dims = normalize(dims);
        let len = dims.iter().product();
        Array {
            class: mxClassID::mxCELL_CLASS,
            dims,
            data: Data::Cell(vec![null_mut(); len]),
        }
    }

    pub(crate) fn structure(dims: &[usize], fields: Vec<CString>) -> Self {
        let dims = normalize(dims);
        let len: usize = dims.iter().product();
        let values = vec![null_mut(); len * fields.len()];
        Array {
            class: mxClassID::mxSTRUCT_CLASS,
            dims,
            data: Data::Struct { fields, values },
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub(crate) fn into_raw(self) -> *mut mxArray {
        host::allocated();
        Box::into_raw(Box::new(self)) as *mut mxArray
    }

    pub(crate) unsafe fn from_raw<'a>(array: *const mxArray) -> Option<&'a Array> {
        (array as *const Array).as_ref()
    }

    pub(crate) unsafe fn from_raw_mut<'a>(array: *mut mxArray) -> Option<&'a mut Array> {
        (array as *mut Array).as_mut()
    }

    pub(crate) unsafe fn destroy(array: *mut mxArray) {
        if !array.is_null() {
            host::released();
            std::mem::drop(Box::from_raw(array as *mut Array));
        }
    }

    pub(crate) fn add_field(&mut self, name: CString) -> Option<usize> {
        let len = self.len();
        match &mut self.data {
            Data::Struct { fields, values } => {
                if let Some(index) = fields.iter().position(|f| *f == name) {
                    return Some(index);
                }

                let n_fields = fields.len();
                let mut widened = Vec::with_capacity(len * (n_fields + 1));
                for element in values.chunks(n_fields.max(1)).take(len) {
                    if n_fields > 0 {
                        widened.extend_from_slice(element);
                    }
                    widened.push(null_mut());
                }
                if n_fields == 0 {
                    widened.resize(len, null_mut());
                }

                fields.push(name);
                *values = widened;
                Some(n_fields)
            }
            _ => None,
        }
    }

    pub(crate) fn duplicate(&self) -> Array {
        unsafe fn copy_all(handles: &[*mut mxArray]) -> Vec<*mut mxArray> {
            handles
                .iter()
                .map(|&h| match Array::from_raw(h) {
                    Some(child) => child.duplicate().into_raw(),
                    None => null_mut(),
                })
                .collect()
        }

        let data = match &self.data {
            Data::Numeric { real, imag } => Data::Numeric {
                real: real.clone(),
                imag: imag.clone(),
            },
            Data::Char(chars) => Data::Char(chars.clone()),
            Data::Logical(logicals) => Data::Logical(logicals.clone()),
            Data::Cell(cells) => Data::Cell(unsafe { copy_all(cells) }),
            Data::Struct { fields, values } => Data::Struct {
                fields: fields.clone(),
                values: unsafe { copy_all(values) },
            },
        };

        Array {
            class: self.class,
            dims: self.dims.clone(),
            data,
        }
    }
}

impl Drop for Array {
    fn drop(&mut self) {
        let children = match &mut self.data {
            Data::Cell(cells) => std::mem::take(cells),
            Data::Struct { values, .. } => std::mem::take(values),
            _ => return,
        };

        for child in children {
            unsafe { Array::destroy(child) }
        }
    }
}
