//! Route calls to named operations.
//!
//! A MEX binary exports a single entry point. To expose more than one operation, the first input
//! of every call is the name of the operation as a char array and the remaining inputs are
//! forwarded to it. A [`Dispatcher`] holds the operations of a binary and resolves the name:
//!
//! ```
//! use mexrs::prelude::*;
//!
//! fn add(outputs: &mut Outputs, inputs: &[MxArray<'_>]) -> MexResult<()> {
//!     let a: f64 = inputs[0].to()?;
//!     let b: f64 = inputs[1].to()?;
//!     outputs.set(0, &(a + b))
//! }
//!
//! let dispatcher = Dispatcher::new().define("add", add);
//!
//! let inputs = [
//!     MxArray::from_value("add").unwrap(),
//!     MxArray::from_value(&1.0).unwrap(),
//!     MxArray::from_value(&2.0).unwrap(),
//! ];
//! let mut outputs = Outputs::new(1);
//! dispatcher.run(&mut outputs, &inputs).unwrap();
//! assert_eq!(outputs.get(0).unwrap().to::<f64>().unwrap(), 3.0);
//! ```
//!
//! With the `registry` feature operations can be defined anywhere in the binary with
//! [`mex_define!`], and [`mex_dispatch!`] exports the entry point that dispatches to all of them.
//!
//! Errors returned by an operation, and panics, are reported to the host with
//! `mexErrMsgIdAndTxt`. The first call registers an exit function with `mexAtExit` that runs the
//! `at_exit` hook and destroys every session.
//!
//! [`mex_define!`]: crate::mex_define
//! [`mex_dispatch!`]: crate::mex_dispatch

use std::{
    any::Any,
    ffi::CString,
    fmt,
    os::raw::c_int,
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    sync::atomic::{AtomicBool, Ordering},
};

use log::debug;
use mex_sys::{host::HostError, mexAtExit, mexErrMsgIdAndTxt, mex_exit_fn, mxArray};
use parking_lot::{const_mutex, Mutex};

use crate::{
    args::check_outputs,
    array::MxArray,
    convert::into_mx::IntoMx,
    error::{c_string, DispatchError, MexError, MexResult},
    session,
};

/// The signature of an operation. The inputs exclude the operation name.
pub type EntryPoint = fn(&mut Outputs, &[MxArray<'_>]) -> MexResult<()>;

#[derive(Copy, Clone)]
enum Admitter {
    Name(&'static str),
    Predicate(fn(&str) -> bool),
}

/// An operation and the names it accepts.
#[derive(Copy, Clone)]
pub struct Operation {
    admitter: Admitter,
    entry: EntryPoint,
}

impl Operation {
    /// An operation called `name`.
    pub const fn new(name: &'static str, entry: EntryPoint) -> Self {
        Operation {
            admitter: Admitter::Name(name),
            entry,
        }
    }

    /// An operation that accepts every name for which `admitter` returns `true`.
    pub const fn admitted_by(admitter: fn(&str) -> bool, entry: EntryPoint) -> Self {
        Operation {
            admitter: Admitter::Predicate(admitter),
            entry,
        }
    }

    /// Returns `true` if this operation handles calls named `name`.
    pub fn admits(&self, name: &str) -> bool {
        match self.admitter {
            Admitter::Name(own) => own == name,
            Admitter::Predicate(admitter) => admitter(name),
        }
    }

    /// The entry point of this operation.
    pub fn entry(&self) -> EntryPoint {
        self.entry
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.admitter {
            Admitter::Name(name) => write!(f, "Operation({})", name),
            Admitter::Predicate(_) => f.write_str("Operation(<predicate>)"),
        }
    }
}

#[cfg(feature = "registry")]
inventory::collect!(Operation);

/// The output slots of a call.
///
/// The host always provides at least one slot, even if no outputs were requested, so a single
/// result can be returned to `ans`. Values assigned to slots beyond that are dropped.
#[derive(Debug)]
pub struct Outputs {
    slots: Vec<MxArray<'static>>,
    requested: usize,
}

impl Outputs {
    /// Slots for a call that requested `nlhs` outputs.
    pub fn new(nlhs: usize) -> Self {
        let mut slots = Vec::with_capacity(nlhs.max(1));
        slots.resize_with(nlhs.max(1), MxArray::empty);
        Outputs {
            slots,
            requested: nlhs,
        }
    }

    /// The number of requested outputs.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// The number of available slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Convert `value` and store it in slot `index`.
    pub fn set<T: IntoMx + ?Sized>(&mut self, index: usize, value: &T) -> MexResult<()> {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = value.into_mx()?;
        }
        Ok(())
    }

    /// Store `value` in slot `index`. If `value` is borrowed a copy is stored.
    pub fn set_array(&mut self, index: usize, mut value: MxArray<'_>) -> MexResult<()> {
        if let Some(slot) = self.slots.get_mut(index) {
            let raw = value.release()?;
            *slot = unsafe { MxArray::from_owned(raw) };
        }
        Ok(())
    }

    /// The value in slot `index`, `None` if it's out of range or unassigned.
    pub fn get(&self, index: usize) -> Option<&MxArray<'static>> {
        self.slots.get(index).filter(|slot| !slot.is_null())
    }

    /// Check that between `mandatory` and `maximum` outputs were requested.
    pub fn expect(&self, maximum: usize, mandatory: usize) -> MexResult<()> {
        check_outputs(self.requested, maximum, mandatory)
    }

    /// Move the assigned values into `plhs`; unassigned slots are set to null.
    ///
    /// Safety: `plhs` must point to at least `self.len()` writable slots.
    pub unsafe fn write_to(self, plhs: *mut *mut mxArray) {
        for (i, mut slot) in self.slots.into_iter().enumerate() {
            *plhs.add(i) = slot.release().unwrap_or(std::ptr::null_mut());
        }
    }
}

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static EXIT_HOOK: Mutex<Option<fn()>> = const_mutex(None);
// mexErrMsgIdAndTxt doesn't return, the message is kept alive here instead of leaking it.
static LAST_ERROR: Mutex<Option<(CString, CString)>> = const_mutex(None);

extern "C" fn run_exit_hooks() {
    let hook = EXIT_HOOK.lock().take();
    if let Some(hook) = hook {
        hook();
    }

    session::clear_all();
    INITIALIZED.store(false, Ordering::SeqCst);
    debug!("module unloaded");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}

/// The operations of a binary and the hooks that run around them.
#[derive(Default)]
pub struct Dispatcher {
    operations: Vec<Operation>,
    at_init: Option<fn()>,
    at_exit: Option<fn()>,
    at_error: Option<fn(&str, &MexError)>,
}

impl Dispatcher {
    /// A dispatcher without operations.
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Add an operation called `name`. Operations are tried in the order they were added.
    pub fn define(self, name: &'static str, entry: EntryPoint) -> Self {
        self.operation(Operation::new(name, entry))
    }

    /// Add an operation that handles every name for which `admitter` returns `true`.
    pub fn define_with(self, admitter: fn(&str) -> bool, entry: EntryPoint) -> Self {
        self.operation(Operation::admitted_by(admitter, entry))
    }

    /// Add `operation`.
    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    /// Add every operation defined with [`mex_define!`].
    ///
    /// [`mex_define!`]: crate::mex_define
    #[cfg(feature = "registry")]
    pub fn with_registered(mut self) -> Self {
        for operation in inventory::iter::<Operation> {
            self.operations.push(*operation);
        }
        self
    }

    /// Call `hook` before the first call is dispatched.
    pub fn at_init(mut self, hook: fn()) -> Self {
        self.at_init = Some(hook);
        self
    }

    /// Call `hook` when the host unloads the binary.
    pub fn at_exit(mut self, hook: fn()) -> Self {
        self.at_exit = Some(hook);
        self
    }

    /// Call `hook` with the operation name and the error when a call fails. The name is empty if
    /// the call failed before it could be read.
    pub fn at_error(mut self, hook: fn(&str, &MexError)) -> Self {
        self.at_error = Some(hook);
        self
    }

    /// The operations of this dispatcher.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Resolve the operation named by the first input and call it with the remaining inputs.
    /// Panics raised by the operation are converted to errors.
    pub fn run(&self, outputs: &mut Outputs, inputs: &[MxArray<'_>]) -> MexResult<()> {
        self.initialize();

        let (name, result) = match self.resolve(inputs) {
            Ok((name, operation)) => {
                debug!("dispatching {}", name);
                let result = catch_unwind(AssertUnwindSafe(|| {
                    (operation.entry)(outputs, &inputs[1..])
                }));

                let result = match result {
                    Ok(result) => result,
                    Err(payload) if payload.is::<HostError>() => resume_unwind(payload),
                    Err(payload) => Err(DispatchError::Panicked {
                        name: name.clone(),
                        message: panic_message(payload.as_ref()),
                    }
                    .into()),
                };
                (name, result)
            }
            Err(e) => (String::new(), Err(e)),
        };

        if let (Err(e), Some(hook)) = (&result, self.at_error) {
            hook(&name, e);
        }

        result
    }

    /// Dispatch a call with the raw arguments of an entry point.
    ///
    /// Safety: the arguments must be those the host passed to `mexFunction`.
    pub unsafe fn dispatch(
        &self,
        nlhs: c_int,
        plhs: *mut *mut mxArray,
        nrhs: c_int,
        prhs: *const *const mxArray,
    ) -> MexResult<()> {
        let inputs: Vec<MxArray<'_>> = (0..nrhs.max(0) as usize)
            .map(|i| MxArray::borrowed(*prhs.add(i)))
            .collect();

        let mut outputs = Outputs::new(nlhs.max(0) as usize);
        self.run(&mut outputs, &inputs)?;
        outputs.write_to(plhs);
        Ok(())
    }

    /// Dispatch a call and report failures to the host, which aborts the call.
    ///
    /// Safety: the arguments must be those the host passed to `mexFunction`.
    pub unsafe fn mex_function(
        &self,
        nlhs: c_int,
        plhs: *mut *mut mxArray,
        nrhs: c_int,
        prhs: *const *const mxArray,
    ) {
        if let Err(e) = self.dispatch(nlhs, plhs, nrhs, prhs) {
            report(&e)
        }
    }

    fn initialize(&self) {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return;
        }

        *EXIT_HOOK.lock() = self.at_exit;
        unsafe { mexAtExit(Some(run_exit_hooks as mex_exit_fn)) };
        debug!("module initialized");

        if let Some(hook) = self.at_init {
            hook();
        }
    }

    fn resolve(&self, inputs: &[MxArray<'_>]) -> MexResult<(String, &Operation)> {
        let first = match inputs.first() {
            Some(first) => first,
            None => Err(DispatchError::MissingOperation)?,
        };

        if !first.is_char() {
            Err(DispatchError::InvalidOperationName {
                found: first.class_name().into(),
            })?;
        }

        let name: String = first.to()?;
        match self.operations.iter().find(|op| op.admits(&name)) {
            Some(operation) => Ok((name, operation)),
            None => Err(DispatchError::UnknownOperation { name })?,
        }
    }
}

fn report(error: &MexError) -> ! {
    let identifier = c_string(error.identifier());
    let message = c_string(&error.to_string());
    let pointers = (identifier.as_ptr(), message.as_ptr());
    *LAST_ERROR.lock() = Some((identifier, message));
    unsafe { mexErrMsgIdAndTxt(pointers.0, pointers.1) }
}

/// Define an operation and register it for [`Dispatcher::with_registered`].
///
/// ```
/// use mexrs::prelude::*;
///
/// mexrs::mex_define!(echo(outputs, inputs) {
///     for (i, input) in inputs.iter().enumerate() {
///         outputs.set_array(i, input.view())?;
///     }
///     Ok(())
/// });
///
/// let dispatcher = Dispatcher::new().with_registered();
/// assert!(dispatcher.operations().iter().any(|op| op.admits("echo")));
/// ```
#[cfg(feature = "registry")]
#[macro_export]
macro_rules! mex_define {
    ($name:ident ($outputs:ident, $inputs:ident) $body:block) => {
        fn $name(
            $outputs: &mut $crate::dispatch::Outputs,
            $inputs: &[$crate::array::MxArray<'_>],
        ) -> $crate::error::MexResult<()> {
            $body
        }

        $crate::inventory::submit! {
            $crate::dispatch::Operation::new(stringify!($name), $name)
        }
    };
}

/// Export `mexFunction`, dispatching to every operation defined with [`mex_define!`].
///
/// The dispatcher can be configured with a closure-like expression that receives it:
///
/// ```ignore
/// mexrs::mex_dispatch!(|dispatcher| dispatcher.at_exit(cleanup));
/// ```
///
/// [`mex_define!`]: crate::mex_define
#[cfg(feature = "registry")]
#[macro_export]
macro_rules! mex_dispatch {
    () => {
        $crate::mex_dispatch!(|dispatcher| dispatcher);
    };
    (|$dispatcher:ident| $configure:expr) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub unsafe extern "C-unwind" fn mexFunction(
            nlhs: ::std::os::raw::c_int,
            plhs: *mut *mut $crate::mex_sys::mxArray,
            nrhs: ::std::os::raw::c_int,
            prhs: *const *const $crate::mex_sys::mxArray,
        ) {
            static DISPATCHER: $crate::once_cell::sync::Lazy<$crate::dispatch::Dispatcher> =
                $crate::once_cell::sync::Lazy::new(|| {
                    let $dispatcher = $crate::dispatch::Dispatcher::new().with_registered();
                    $configure
                });

            DISPATCHER.mex_function(nlhs, plhs, nrhs, prhs)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twice(outputs: &mut Outputs, inputs: &[MxArray<'_>]) -> MexResult<()> {
        let value: f64 = inputs[0].to()?;
        outputs.set(0, &(2.0 * value))
    }

    fn fail(_: &mut Outputs, _: &[MxArray<'_>]) -> MexResult<()> {
        panic!("boom")
    }

    fn starts_with_get(name: &str) -> bool {
        name.starts_with("get")
    }

    fn name_of(outputs: &mut Outputs, _: &[MxArray<'_>]) -> MexResult<()> {
        outputs.set(0, "getter")
    }

    fn call(dispatcher: &Dispatcher, inputs: &[MxArray<'_>]) -> MexResult<Outputs> {
        let mut outputs = Outputs::new(1);
        dispatcher.run(&mut outputs, inputs)?;
        Ok(outputs)
    }

    #[test]
    fn routes_by_name() {
        let dispatcher = Dispatcher::new()
            .define("twice", twice)
            .define_with(starts_with_get, name_of);

        let inputs = [
            MxArray::from_value("twice").unwrap(),
            MxArray::from_value(&4i32).unwrap(),
        ];
        let outputs = call(&dispatcher, &inputs).unwrap();
        assert_eq!(outputs.get(0).unwrap().to::<f64>().unwrap(), 8.0);

        let inputs = [MxArray::from_value("getAnything").unwrap()];
        let outputs = call(&dispatcher, &inputs).unwrap();
        assert_eq!(outputs.get(0).unwrap().to::<String>().unwrap(), "getter");
    }

    #[test]
    fn invalid_names_are_errors() {
        let dispatcher = Dispatcher::new().define("twice", twice);

        let err = call(&dispatcher, &[]).unwrap_err();
        assert_eq!(err.identifier(), "mexrs:dispatch:argumentError");

        let inputs = [MxArray::from_value(&1.0).unwrap()];
        let err = call(&dispatcher, &inputs).unwrap_err();
        assert_eq!(err.identifier(), "mexrs:dispatch:argumentError");

        let inputs = [MxArray::from_value("thrice").unwrap()];
        let err = call(&dispatcher, &inputs).unwrap_err();
        assert!(err.to_string().contains("invalid operation: thrice"));
    }

    #[test]
    fn panics_become_errors() {
        let dispatcher = Dispatcher::new().define("fail", fail);
        let inputs = [MxArray::from_value("fail").unwrap()];
        let err = call(&dispatcher, &inputs).unwrap_err();
        assert!(matches!(
            *err,
            MexError::DispatchError(DispatchError::Panicked { .. })
        ));
    }

    #[test]
    fn outputs_beyond_the_slots_are_dropped() {
        let mut outputs = Outputs::new(0);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.requested(), 0);

        outputs.set(0, &1.0).unwrap();
        outputs.set(3, &1.0).unwrap();
        assert!(outputs.get(0).is_some());
        assert!(outputs.get(3).is_none());
    }
}
