#![allow(non_snake_case)]

use std::{
    ffi::{c_void, CStr},
    os::raw::{c_char, c_int},
    ptr::{null, null_mut},
};

use crate::{
    host,
    storage::{self, Array, Data},
    types::*,
};

unsafe fn c_str_lossy(s: *const c_char) -> String {
    if s.is_null() {
        String::new()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

unsafe fn dims_from_raw(ndim: mwSize, dims: *const mwSize) -> Vec<usize> {
    if dims.is_null() || ndim == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(dims, ndim).to_vec()
    }
}

// Creation

pub unsafe extern "C" fn mxCreateNumericMatrix(
    m: mwSize,
    n: mwSize,
    classid: mxClassID,
    flag: mxComplexity,
) -> *mut mxArray {
    mxCreateNumericArray(2, [m, n].as_ptr(), classid, flag)
}

pub unsafe extern "C" fn mxCreateNumericArray(
    ndim: mwSize,
    dims: *const mwSize,
    classid: mxClassID,
    flag: mxComplexity,
) -> *mut mxArray {
    let dims = dims_from_raw(ndim, dims);
    match Array::numeric(classid, &dims, flag == mxComplexity::mxCOMPLEX) {
        Some(array) => array.into_raw(),
        None => null_mut(),
    }
}

pub unsafe extern "C" fn mxCreateDoubleScalar(value: f64) -> *mut mxArray {
    let array = mxCreateNumericMatrix(1, 1, mxClassID::mxDOUBLE_CLASS, mxComplexity::mxREAL);
    *(mxGetData(array) as *mut f64) = value;
    array
}

pub unsafe extern "C" fn mxCreateLogicalMatrix(m: mwSize, n: mwSize) -> *mut mxArray {
    Array::logical(&[m, n]).into_raw()
}

pub unsafe extern "C" fn mxCreateLogicalScalar(value: mxLogical) -> *mut mxArray {
    let array = mxCreateLogicalMatrix(1, 1);
    *mxGetLogicals(array) = value;
    array
}

pub unsafe extern "C" fn mxCreateCharArray(ndim: mwSize, dims: *const mwSize) -> *mut mxArray {
    Array::chars(&dims_from_raw(ndim, dims)).into_raw()
}

pub unsafe extern "C" fn mxCreateString(s: *const c_char) -> *mut mxArray {
    if s.is_null() {
        return null_mut();
    }

    let units: Vec<u16> = c_str_lossy(s).encode_utf16().collect();
    let mut array = Array::chars(&[1, units.len()]);
    array.data = Data::Char(units);
    array.into_raw()
}

pub unsafe extern "C" fn mxCreateCellMatrix(m: mwSize, n: mwSize) -> *mut mxArray {
    Array::cell(&[m, n]).into_raw()
}

pub unsafe extern "C" fn mxCreateStructMatrix(
    m: mwSize,
    n: mwSize,
    nfields: c_int,
    fieldnames: *const *const c_char,
) -> *mut mxArray {
    let mut fields = Vec::with_capacity(nfields.max(0) as usize);
    for i in 0..nfields.max(0) as usize {
        let name = *fieldnames.add(i);
        if name.is_null() {
            return null_mut();
        }

        let name = CStr::from_ptr(name).to_owned();
        if fields.contains(&name) {
            return null_mut();
        }
        fields.push(name);
    }

    Array::structure(&[m, n], fields).into_raw()
}

// Lifecycle

pub unsafe extern "C" fn mxDestroyArray(pa: *mut mxArray) {
    Array::destroy(pa)
}

pub unsafe extern "C" fn mxDuplicateArray(pa: *const mxArray) -> *mut mxArray {
    match Array::from_raw(pa) {
        Some(array) => array.duplicate().into_raw(),
        None => null_mut(),
    }
}

// Introspection

pub unsafe extern "C" fn mxGetClassID(pa: *const mxArray) -> mxClassID {
    match Array::from_raw(pa) {
        Some(array) => array.class,
        None => mxClassID::mxUNKNOWN_CLASS,
    }
}

pub unsafe extern "C" fn mxGetClassName(pa: *const mxArray) -> *const c_char {
    let name: &'static [u8] = match mxGetClassID(pa) {
        mxClassID::mxUNKNOWN_CLASS => b"unknown\0",
        mxClassID::mxCELL_CLASS => b"cell\0",
        mxClassID::mxSTRUCT_CLASS => b"struct\0",
        mxClassID::mxLOGICAL_CLASS => b"logical\0",
        mxClassID::mxCHAR_CLASS => b"char\0",
        mxClassID::mxVOID_CLASS => b"void\0",
        mxClassID::mxDOUBLE_CLASS => b"double\0",
        mxClassID::mxSINGLE_CLASS => b"single\0",
        mxClassID::mxINT8_CLASS => b"int8\0",
        mxClassID::mxUINT8_CLASS => b"uint8\0",
        mxClassID::mxINT16_CLASS => b"int16\0",
        mxClassID::mxUINT16_CLASS => b"uint16\0",
        mxClassID::mxINT32_CLASS => b"int32\0",
        mxClassID::mxUINT32_CLASS => b"uint32\0",
        mxClassID::mxINT64_CLASS => b"int64\0",
        mxClassID::mxUINT64_CLASS => b"uint64\0",
        mxClassID::mxFUNCTION_CLASS => b"function_handle\0",
    };
    name.as_ptr() as *const c_char
}

pub unsafe extern "C" fn mxIsClass(pa: *const mxArray, name: *const c_char) -> bool {
    if name.is_null() {
        return false;
    }
    CStr::from_ptr(mxGetClassName(pa)) == CStr::from_ptr(name)
}

pub unsafe extern "C" fn mxIsNumeric(pa: *const mxArray) -> bool {
    storage::is_numeric(mxGetClassID(pa))
}

pub unsafe extern "C" fn mxIsComplex(pa: *const mxArray) -> bool {
    matches!(
        Array::from_raw(pa).map(|a| &a.data),
        Some(Data::Numeric { imag: Some(_), .. })
    )
}

pub unsafe extern "C" fn mxIsCell(pa: *const mxArray) -> bool {
    mxGetClassID(pa) == mxClassID::mxCELL_CLASS
}

pub unsafe extern "C" fn mxIsStruct(pa: *const mxArray) -> bool {
    mxGetClassID(pa) == mxClassID::mxSTRUCT_CLASS
}

pub unsafe extern "C" fn mxIsChar(pa: *const mxArray) -> bool {
    mxGetClassID(pa) == mxClassID::mxCHAR_CLASS
}

pub unsafe extern "C" fn mxIsLogical(pa: *const mxArray) -> bool {
    mxGetClassID(pa) == mxClassID::mxLOGICAL_CLASS
}

pub unsafe extern "C" fn mxIsFunctionHandle(pa: *const mxArray) -> bool {
    mxGetClassID(pa) == mxClassID::mxFUNCTION_CLASS
}

/// Sparse storage isn't modelled, no array is sparse.
pub unsafe extern "C" fn mxIsSparse(_pa: *const mxArray) -> bool {
    false
}

pub unsafe extern "C" fn mxIsNaN(value: f64) -> bool {
    value.is_nan()
}

pub unsafe extern "C" fn mxIsInf(value: f64) -> bool {
    value.is_infinite()
}

pub unsafe extern "C" fn mxGetEps() -> f64 {
    f64::EPSILON
}

pub unsafe extern "C" fn mxIsEmpty(pa: *const mxArray) -> bool {
    mxGetNumberOfElements(pa) == 0
}

pub unsafe extern "C" fn mxGetNumberOfElements(pa: *const mxArray) -> usize {
    Array::from_raw(pa).map(Array::len).unwrap_or(0)
}

pub unsafe extern "C" fn mxGetNumberOfDimensions(pa: *const mxArray) -> mwSize {
    Array::from_raw(pa).map(|a| a.dims.len()).unwrap_or(0)
}

pub unsafe extern "C" fn mxGetDimensions(pa: *const mxArray) -> *const mwSize {
    match Array::from_raw(pa) {
        Some(array) => array.dims.as_ptr(),
        None => null(),
    }
}

pub unsafe extern "C" fn mxGetM(pa: *const mxArray) -> usize {
    Array::from_raw(pa).map(|a| a.dims[0]).unwrap_or(0)
}

pub unsafe extern "C" fn mxGetN(pa: *const mxArray) -> usize {
    Array::from_raw(pa)
        .map(|a| a.dims[1..].iter().product())
        .unwrap_or(0)
}

pub unsafe extern "C" fn mxCalcSingleSubscript(
    pa: *const mxArray,
    nsubs: mwSize,
    subs: *const mwIndex,
) -> mwIndex {
    let array = match Array::from_raw(pa) {
        Some(array) => array,
        None => return 0,
    };

    let subs = dims_from_raw(nsubs, subs);
    let mut stride = 1;
    let mut index = 0;
    for (k, sub) in subs.iter().enumerate() {
        index += sub * stride;
        stride *= array.dims.get(k).copied().unwrap_or(1);
    }

    index
}

// Data

pub unsafe extern "C" fn mxGetData(pa: *const mxArray) -> *mut c_void {
    match Array::from_raw_mut(pa as *mut mxArray).map(|a| &mut a.data) {
        Some(Data::Numeric { real, .. }) => real.as_mut_ptr() as *mut c_void,
        Some(Data::Char(chars)) => chars.as_mut_ptr() as *mut c_void,
        Some(Data::Logical(logicals)) => logicals.as_mut_ptr() as *mut c_void,
        _ => null_mut(),
    }
}

pub unsafe extern "C" fn mxGetImagData(pa: *const mxArray) -> *mut c_void {
    match Array::from_raw_mut(pa as *mut mxArray).map(|a| &mut a.data) {
        Some(Data::Numeric {
            imag: Some(imag), ..
        }) => imag.as_mut_ptr() as *mut c_void,
        _ => null_mut(),
    }
}

pub unsafe extern "C" fn mxGetChars(pa: *const mxArray) -> *mut mxChar {
    match Array::from_raw_mut(pa as *mut mxArray).map(|a| &mut a.data) {
        Some(Data::Char(chars)) => chars.as_mut_ptr(),
        _ => null_mut(),
    }
}

pub unsafe extern "C" fn mxGetLogicals(pa: *const mxArray) -> *mut mxLogical {
    match Array::from_raw_mut(pa as *mut mxArray).map(|a| &mut a.data) {
        Some(Data::Logical(logicals)) => logicals.as_mut_ptr(),
        _ => null_mut(),
    }
}

// Cells

pub unsafe extern "C" fn mxGetCell(pa: *const mxArray, i: mwIndex) -> *mut mxArray {
    match Array::from_raw(pa).map(|a| &a.data) {
        Some(Data::Cell(cells)) => cells.get(i).copied().unwrap_or(null_mut()),
        _ => null_mut(),
    }
}

/// Stores `value` in cell `i`. The previous occupant is not destroyed.
pub unsafe extern "C" fn mxSetCell(pa: *mut mxArray, i: mwIndex, value: *mut mxArray) {
    if let Some(Data::Cell(cells)) = Array::from_raw_mut(pa).map(|a| &mut a.data) {
        if let Some(slot) = cells.get_mut(i) {
            *slot = value;
        }
    }
}

// Structs

pub unsafe extern "C" fn mxGetNumberOfFields(pa: *const mxArray) -> c_int {
    match Array::from_raw(pa).map(|a| &a.data) {
        Some(Data::Struct { fields, .. }) => fields.len() as c_int,
        _ => 0,
    }
}

pub unsafe extern "C" fn mxGetFieldNameByNumber(pa: *const mxArray, n: c_int) -> *const c_char {
    match Array::from_raw(pa).map(|a| &a.data) {
        Some(Data::Struct { fields, .. }) if n >= 0 => match fields.get(n as usize) {
            Some(name) => name.as_ptr(),
            None => null(),
        },
        _ => null(),
    }
}

pub unsafe extern "C" fn mxGetFieldNumber(pa: *const mxArray, name: *const c_char) -> c_int {
    if name.is_null() {
        return -1;
    }

    let name = CStr::from_ptr(name);
    match Array::from_raw(pa).map(|a| &a.data) {
        Some(Data::Struct { fields, .. }) => fields
            .iter()
            .position(|f| f.as_c_str() == name)
            .map(|i| i as c_int)
            .unwrap_or(-1),
        _ => -1,
    }
}

pub unsafe extern "C" fn mxGetFieldByNumber(
    pa: *const mxArray,
    i: mwIndex,
    fieldnum: c_int,
) -> *mut mxArray {
    match Array::from_raw(pa).map(|a| &a.data) {
        Some(Data::Struct { fields, values }) if fieldnum >= 0 => {
            let fieldnum = fieldnum as usize;
            if fieldnum >= fields.len() {
                return null_mut();
            }
            values
                .get(i * fields.len() + fieldnum)
                .copied()
                .unwrap_or(null_mut())
        }
        _ => null_mut(),
    }
}

pub unsafe extern "C" fn mxGetField(
    pa: *const mxArray,
    i: mwIndex,
    fieldname: *const c_char,
) -> *mut mxArray {
    let fieldnum = mxGetFieldNumber(pa, fieldname);
    if fieldnum < 0 {
        return null_mut();
    }
    mxGetFieldByNumber(pa, i, fieldnum)
}

/// Stores `value` in field `fieldnum` of element `i`. The previous occupant is not destroyed.
pub unsafe extern "C" fn mxSetFieldByNumber(
    pa: *mut mxArray,
    i: mwIndex,
    fieldnum: c_int,
    value: *mut mxArray,
) {
    if let Some(Data::Struct { fields, values }) = Array::from_raw_mut(pa).map(|a| &mut a.data) {
        if fieldnum < 0 || fieldnum as usize >= fields.len() {
            return;
        }
        if let Some(slot) = values.get_mut(i * fields.len() + fieldnum as usize) {
            *slot = value;
        }
    }
}

pub unsafe extern "C" fn mxAddField(pa: *mut mxArray, fieldname: *const c_char) -> c_int {
    if fieldname.is_null() {
        return -1;
    }

    let name = CStr::from_ptr(fieldname).to_owned();
    match Array::from_raw_mut(pa).and_then(|a| a.add_field(name)) {
        Some(index) => index as c_int,
        None => -1,
    }
}

// Module

pub unsafe extern "C" fn mexLock() {
    host::lock()
}

pub unsafe extern "C" fn mexUnlock() {
    host::unlock()
}

pub unsafe extern "C" fn mexIsLocked() -> bool {
    host::lock_count() > 0
}

/// Registers the function run when the module is unloaded, replacing any earlier one.
pub unsafe extern "C" fn mexAtExit(exit_fcn: Option<mex_exit_fn>) -> c_int {
    host::set_exit_fn(exit_fcn);
    0
}

pub unsafe extern "C" fn mexPrintf(message: *const c_char) -> c_int {
    let message = c_str_lossy(message);
    let len = message.len();
    host::print(&message);
    len as c_int
}

// Errors

/// Aborts the current call. Control returns to the host, which reports `errorid` and
/// `errormsg`; nothing after this call runs.
pub unsafe extern "C-unwind" fn mexErrMsgIdAndTxt(
    errorid: *const c_char,
    errormsg: *const c_char,
) -> ! {
    let error = host::HostError {
        identifier: c_str_lossy(errorid),
        message: c_str_lossy(errormsg),
    };
    std::panic::resume_unwind(Box::new(error))
}

pub unsafe extern "C-unwind" fn mexErrMsgTxt(errormsg: *const c_char) -> ! {
    mexErrMsgIdAndTxt(null(), errormsg)
}

pub unsafe extern "C" fn mexWarnMsgIdAndTxt(warningid: *const c_char, warningmsg: *const c_char) {
    host::warn(host::HostWarning {
        identifier: c_str_lossy(warningid),
        message: c_str_lossy(warningmsg),
    })
}

