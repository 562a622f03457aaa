//! The host side of the reference implementation.
//!
//! The host is single-threaded: its module lock, exit function, warnings and printed output are
//! tracked per thread, so every thread behaves like an independent host session.

use std::{
    any::Any,
    cell::RefCell,
    error::Error,
    fmt,
    os::raw::c_int,
    panic::{catch_unwind, AssertUnwindSafe},
    ptr::null_mut,
};

use crate::{
    bindings::mxDestroyArray,
    types::{mex_exit_fn, mxArray, MexFunction},
};

/// Error raised by `mexErrMsgIdAndTxt`, or by a panic that escaped the entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostError {
    pub identifier: String,
    pub message: String,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identifier.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.identifier, self.message)
        }
    }
}

impl Error for HostError {}

/// Warning raised by `mexWarnMsgIdAndTxt`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostWarning {
    pub identifier: String,
    pub message: String,
}

#[derive(Default)]
struct HostState {
    locks: usize,
    live: usize,
    exit_fn: Option<mex_exit_fn>,
    warnings: Vec<HostWarning>,
    output: String,
}

thread_local! {
    static HOST: RefCell<HostState> = RefCell::new(HostState::default());
}

pub(crate) fn lock() {
    HOST.with(|h| h.borrow_mut().locks += 1)
}

pub(crate) fn unlock() {
    HOST.with(|h| {
        let mut h = h.borrow_mut();
        h.locks = h.locks.saturating_sub(1);
    })
}

pub(crate) fn allocated() {
    HOST.with(|h| h.borrow_mut().live += 1)
}

pub(crate) fn released() {
    HOST.with(|h| {
        let mut h = h.borrow_mut();
        h.live = h.live.saturating_sub(1);
    })
}

pub(crate) fn set_exit_fn(exit_fn: Option<mex_exit_fn>) {
    HOST.with(|h| h.borrow_mut().exit_fn = exit_fn)
}

pub(crate) fn warn(warning: HostWarning) {
    HOST.with(|h| h.borrow_mut().warnings.push(warning))
}

pub(crate) fn print(message: &str) {
    HOST.with(|h| h.borrow_mut().output.push_str(message))
}

/// Number of outstanding `mexLock` calls.
pub fn lock_count() -> usize {
    HOST.with(|h| h.borrow().locks)
}

/// Number of arrays allocated on this thread that haven't been destroyed, nested elements
/// included.
pub fn live_arrays() -> usize {
    HOST.with(|h| h.borrow().live)
}

/// Drain the warnings raised since the last call.
pub fn take_warnings() -> Vec<HostWarning> {
    HOST.with(|h| std::mem::take(&mut h.borrow_mut().warnings))
}

/// Drain everything printed with `mexPrintf` since the last call.
pub fn take_output() -> String {
    HOST.with(|h| std::mem::take(&mut h.borrow_mut().output))
}

/// Unload the module the way `clear mex` does. A locked module stays loaded and `false` is
/// returned; otherwise the registered exit function runs.
pub fn unload() -> bool {
    if lock_count() > 0 {
        return false;
    }

    shutdown();
    true
}

/// Run the registered exit function unconditionally, as the host does when it terminates.
pub fn shutdown() {
    // The exit function may call back into the host.
    let exit_fn = HOST.with(|h| h.borrow_mut().exit_fn.take());
    if let Some(exit_fn) = exit_fn {
        unsafe { exit_fn() }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("entry point panicked")
    }
}

/// Call `entry` the way the host does: `nlhs` outputs are requested and `inputs` are passed as
/// the right-hand side.
///
/// On success the output slots are returned; there is always at least one slot, and unassigned
/// slots are null. The caller owns every non-null handle. If the entry point raises an error,
/// the assigned outputs are destroyed and the error is returned.
///
/// Safety: every handle in `inputs` must be valid for the duration of the call.
pub unsafe fn call(
    entry: MexFunction,
    nlhs: usize,
    inputs: &[*const mxArray],
) -> Result<Vec<*mut mxArray>, HostError> {
    let mut outputs = vec![null_mut::<mxArray>(); nlhs.max(1)];
    let outputs_ptr = outputs.as_mut_ptr();

    let result = catch_unwind(AssertUnwindSafe(|| {
        entry(
            nlhs as c_int,
            outputs_ptr,
            inputs.len() as c_int,
            inputs.as_ptr(),
        )
    }));

    match result {
        Ok(()) => Ok(outputs),
        Err(payload) => {
            for output in outputs {
                mxDestroyArray(output);
            }

            match payload.downcast::<HostError>() {
                Ok(error) => Err(*error),
                Err(payload) => Err(HostError {
                    identifier: String::from("mex:panic"),
                    message: panic_message(payload.as_ref()),
                }),
            }
        }
    }
}
