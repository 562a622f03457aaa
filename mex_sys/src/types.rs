#![allow(non_camel_case_types)]

use std::os::raw::c_int;

pub type mwSize = usize;
pub type mwIndex = usize;
pub type mwSignedIndex = isize;
pub type mxChar = u16;
pub type mxLogical = bool;

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct mxArray {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum mxClassID {
    mxUNKNOWN_CLASS = 0,
    mxCELL_CLASS = 1,
    mxSTRUCT_CLASS = 2,
    mxLOGICAL_CLASS = 3,
    mxCHAR_CLASS = 4,
    mxVOID_CLASS = 5,
    mxDOUBLE_CLASS = 6,
    mxSINGLE_CLASS = 7,
    mxINT8_CLASS = 8,
    mxUINT8_CLASS = 9,
    mxINT16_CLASS = 10,
    mxUINT16_CLASS = 11,
    mxINT32_CLASS = 12,
    mxUINT32_CLASS = 13,
    mxINT64_CLASS = 14,
    mxUINT64_CLASS = 15,
    mxFUNCTION_CLASS = 16,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum mxComplexity {
    mxREAL = 0,
    mxCOMPLEX = 1,
}

/// Signature of a MEX entry point.
pub type MexFunction = unsafe extern "C-unwind" fn(
    nlhs: c_int,
    plhs: *mut *mut mxArray,
    nrhs: c_int,
    prhs: *const *const mxArray,
);

/// Signature of a function registered with `mexAtExit`.
pub type mex_exit_fn = unsafe extern "C" fn();
