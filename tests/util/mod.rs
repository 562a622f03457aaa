#![allow(dead_code)]

use mexrs::{
    array::MxArray,
    mex_sys::{
        host::{self, HostError},
        mxArray, MexFunction,
    },
};

/// Call `entry` through the reference host and take ownership of the outputs.
pub fn call(
    entry: MexFunction,
    nlhs: usize,
    inputs: &[MxArray<'_>],
) -> Result<Vec<MxArray<'static>>, HostError> {
    let inputs: Vec<*const mxArray> = inputs.iter().map(|input| input.as_ptr()).collect();
    let outputs = unsafe { host::call(entry, nlhs, &inputs)? };
    Ok(outputs
        .into_iter()
        .map(|output| unsafe { MxArray::from_owned(output) })
        .collect())
}

/// The inputs of a dispatched call: the operation name followed by `args`.
pub fn operation(name: &str, args: Vec<MxArray<'static>>) -> Vec<MxArray<'static>> {
    let mut inputs = Vec::with_capacity(args.len() + 1);
    inputs.push(MxArray::from_value(name).unwrap());
    inputs.extend(args);
    inputs
}

/// The messages of the warnings raised since the last call.
pub fn warnings() -> Vec<String> {
    host::take_warnings()
        .into_iter()
        .map(|warning| warning.message)
        .collect()
}
