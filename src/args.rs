//! Parse the inputs and outputs of an operation.
//!
//! [`InputArguments`] matches the inputs of a call against one or more signatures. A signature
//! has a number of mandatory inputs followed by named options. Options are passed either as
//! name/value pairs or as a single trailing scalar struct whose fields are option names:
//!
//! ```
//! use mexrs::prelude::*;
//!
//! let inputs = [
//!     MxArray::from_value(&3.0).unwrap(),
//!     MxArray::from_value("Scale").unwrap(),
//!     MxArray::from_value(&2i32).unwrap(),
//! ];
//!
//! let args = InputArguments::new(&inputs, 1, &["scale", "offset"]).unwrap();
//! assert_eq!(args.get_as::<f64>(0).unwrap(), 3.0);
//! assert_eq!(args.option_or("scale", 1.0).unwrap(), 2.0);
//! assert_eq!(args.option_or("offset", 0.0).unwrap(), 0.0);
//! ```
//!
//! [`OutputArguments`] checks the number of requested outputs.

use std::collections::BTreeMap;

use crate::{
    array::MxArray,
    convert::{from_mx::FromMx, into_mx::IntoMx},
    dispatch::Outputs,
    error::{warn_host, ArgumentError, MexResult, ARGUMENTS_WARNING},
};

/// The maximum length of an option name.
pub const MAX_OPTION_NAME: usize = 64;

const DEFAULT_SIGNATURE: &str = "default";

#[derive(Clone, Debug)]
enum OptionValue {
    Input(usize),
    Field { input: usize, field: String },
}

#[derive(Clone, Debug)]
struct Signature {
    mandatory: usize,
    options: Vec<(String, Option<OptionValue>)>,
}

impl Signature {
    fn new(mandatory: usize, options: &[&str]) -> Self {
        let mut signature = Signature {
            mandatory,
            options: Vec::with_capacity(options.len()),
        };

        for name in options {
            if signature.find(name).is_none() {
                signature.options.push((name.to_string(), None));
            }
        }

        signature
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|(own, _)| own.eq_ignore_ascii_case(name))
    }

    fn option_index(&self, name: &str) -> Result<usize, String> {
        if name.len() > MAX_OPTION_NAME {
            return Err(format!(
                "Option name too long: {} characters for {}.",
                name.len(),
                MAX_OPTION_NAME
            ));
        }

        self.find(name)
            .ok_or_else(|| format!("Invalid option name: '{}'.", name))
    }

    fn parse(&mut self, inputs: &[MxArray<'_>]) -> Result<(), String> {
        if inputs.len() < self.mandatory {
            return Err(format!(
                "Too few arguments: {} for at least {}.",
                inputs.len(),
                self.mandatory
            ));
        }

        for (_, value) in self.options.iter_mut() {
            *value = None;
        }

        let mut index = self.mandatory;
        let last = inputs.get(index);
        if inputs.len() - index == 1 && last.map_or(false, |a| a.is_struct() && a.size() == 1) {
            for field in inputs[index].field_names() {
                let k = self.option_index(&field)?;
                self.options[k].1 = Some(OptionValue::Field { input: index, field });
            }
            return Ok(());
        }

        while index < inputs.len() {
            let name = &inputs[index];
            index += 1;
            if !name.is_char() {
                return Err(format!(
                    "Option name must be char but is given {}.",
                    name.class_name()
                ));
            }

            let name: String = name.to().map_err(|e| e.to_string())?;
            let k = self.option_index(&name)?;
            if index >= inputs.len() {
                return Err(format!("Missing option value for option '{}'.", name));
            }

            if self.options[k].1.is_some() {
                warn_host(
                    ARGUMENTS_WARNING,
                    &format!("Option '{}' appeared more than once.", name),
                );
            }

            self.options[k].1 = Some(OptionValue::Input(index));
            index += 1;
        }

        Ok(())
    }
}

/// The inputs of a call matched against named signatures.
#[derive(Clone, Debug, Default)]
pub struct InputArguments<'a> {
    inputs: &'a [MxArray<'a>],
    signatures: BTreeMap<String, Signature>,
}

impl<'a> InputArguments<'a> {
    /// Parse `inputs` with a single signature of `mandatory` inputs followed by `options`.
    pub fn new(inputs: &'a [MxArray<'a>], mandatory: usize, options: &[&str]) -> MexResult<Self> {
        let mut args = InputArguments::default();
        args.define(DEFAULT_SIGNATURE, mandatory, options);
        args.parse(inputs)?;
        Ok(args)
    }

    /// Add a signature called `name`. Option names are case-insensitive.
    pub fn define(&mut self, name: &str, mandatory: usize, options: &[&str]) -> &mut Self {
        self.signatures
            .insert(name.to_string(), Signature::new(mandatory, options));
        self
    }

    /// Match `inputs` against every signature. A host warning is raised if more than one
    /// signature matches.
    pub fn parse(&mut self, inputs: &'a [MxArray<'a>]) -> MexResult<()> {
        self.parse_with(inputs, false)
    }

    /// Match `inputs` against every signature, signatures that don't match are removed. If none
    /// match the error describes the failure of the last signature that was tried.
    pub fn parse_with(
        &mut self,
        inputs: &'a [MxArray<'a>],
        ignore_multiple_signatures: bool,
    ) -> MexResult<()> {
        if self.signatures.is_empty() {
            Err(ArgumentError::NoSignature)?;
        }

        self.inputs = inputs;
        let mut message = None;
        self.signatures
            .retain(|_, signature| match signature.parse(inputs) {
                Ok(()) => true,
                Err(e) => {
                    message = Some(e);
                    false
                }
            });

        if self.signatures.is_empty() {
            Err(ArgumentError::NoMatchingSignature {
                message: message.unwrap_or_else(|| String::from("Invalid arguments.")),
            })?;
        }

        if self.signatures.len() > 1 && !ignore_multiple_signatures {
            warn_host(
                ARGUMENTS_WARNING,
                "Input arguments match more than one signature.",
            );
        }

        Ok(())
    }

    /// Returns `true` if the inputs match signature `name`.
    pub fn is(&self, name: &str) -> bool {
        self.signatures.contains_key(name)
    }

    fn matched(&self) -> MexResult<&Signature> {
        match self.signatures.values().next() {
            Some(signature) => Ok(signature),
            None => Err(ArgumentError::NoSignature)?,
        }
    }

    /// Mandatory input `index` of the matched signature.
    pub fn get(&self, index: usize) -> MexResult<MxArray<'a>> {
        let signature = self.matched()?;
        if index >= signature.mandatory {
            Err(ArgumentError::InputIndex {
                index,
                len: signature.mandatory,
            })?;
        }

        let inputs: &'a [MxArray<'a>] = self.inputs;
        Ok(inputs[index].view())
    }

    /// Mandatory input `index` of the matched signature converted to `T`.
    pub fn get_as<T: FromMx>(&self, index: usize) -> MexResult<T> {
        self.get(index)?.to()
    }

    /// The value of option `name`, `None` if it wasn't given.
    pub fn option(&self, name: &str) -> MexResult<Option<MxArray<'a>>> {
        let signature = self.matched()?;
        let k = match signature.find(name) {
            Some(k) => k,
            None => Err(ArgumentError::UnknownOption { name: name.into() })?,
        };

        let inputs: &'a [MxArray<'a>] = self.inputs;
        match &signature.options[k].1 {
            None => Ok(None),
            Some(OptionValue::Input(i)) => Ok(Some(inputs[*i].view())),
            Some(OptionValue::Field { input, field }) => inputs[*input].field(field, 0),
        }
    }

    /// The value of option `name` converted to `T`, or `default` if it wasn't given.
    pub fn option_or<T: FromMx>(&self, name: &str, default: T) -> MexResult<T> {
        match self.option(name)? {
            Some(value) => value.to(),
            None => Ok(default),
        }
    }
}

pub(crate) fn check_outputs(requested: usize, maximum: usize, mandatory: usize) -> MexResult<()> {
    if mandatory > requested {
        Err(ArgumentError::TooFewOutputs {
            found: requested,
            mandatory,
        })?;
    }

    if maximum < requested {
        Err(ArgumentError::TooManyOutputs {
            found: requested,
            maximum,
        })?;
    }

    Ok(())
}

/// The outputs of a call with a checked count.
#[derive(Debug)]
pub struct OutputArguments<'a> {
    outputs: &'a mut Outputs,
}

impl<'a> OutputArguments<'a> {
    /// Check that between `mandatory` and `maximum` outputs were requested.
    pub fn new(outputs: &'a mut Outputs, maximum: usize, mandatory: usize) -> MexResult<Self> {
        outputs.expect(maximum, mandatory)?;
        Ok(OutputArguments { outputs })
    }

    /// The number of requested outputs.
    pub fn len(&self) -> usize {
        self.outputs.requested()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, index: usize) -> MexResult<()> {
        if index >= self.len() {
            Err(ArgumentError::OutputIndex { index })?;
        }
        Ok(())
    }

    /// Convert `value` and store it in output `index`. Outputs that weren't requested are
    /// dropped.
    pub fn set<T: IntoMx + ?Sized>(&mut self, index: usize, value: &T) -> MexResult<()> {
        self.outputs.set(index, value)
    }

    /// Convert `value` and store it in output `index`, which must have been requested.
    pub fn assign<T: IntoMx + ?Sized>(&mut self, index: usize, value: &T) -> MexResult<()> {
        self.check(index)?;
        self.outputs.set(index, value)
    }

    /// Store `value` in output `index`, which must have been requested.
    pub fn assign_array(&mut self, index: usize, value: MxArray<'_>) -> MexResult<()> {
        self.check(index)?;
        self.outputs.set_array(index, value)
    }

    /// The value of output `index`, which must have been requested. `None` if it's unassigned.
    pub fn get(&self, index: usize) -> MexResult<Option<&MxArray<'static>>> {
        self.check(index)?;
        Ok(self.outputs.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_inputs_are_counted() {
        let inputs = vec![MxArray::from_value(&1.0).unwrap()];
        let err = InputArguments::new(&inputs, 2, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument error: Too few arguments: 1 for at least 2."
        );

        let args = InputArguments::new(&inputs, 1, &[]).unwrap();
        assert!(args.is("default"));
        assert!(args.get(1).is_err());
    }

    #[test]
    fn option_names_are_case_insensitive() {
        let inputs = vec![MxArray::from_value("OFFSET").unwrap(), MxArray::from_value(&5u8).unwrap()];
        let args = InputArguments::new(&inputs, 0, &["offset"]).unwrap();
        assert_eq!(args.option_or("Offset", 0i32).unwrap(), 5);
        assert!(args.option("other").is_err());
    }

    #[test]
    fn invalid_option_lists() {
        let inputs = vec![MxArray::from_value(&5u8).unwrap()];
        let err = InputArguments::new(&inputs, 0, &["a"]).unwrap_err();
        assert!(err.to_string().contains("Option name must be char but is given uint8."));

        let inputs = vec![MxArray::from_value("a").unwrap()];
        let err = InputArguments::new(&inputs, 0, &["a"]).unwrap_err();
        assert!(err.to_string().contains("Missing option value for option 'a'."));

        let inputs = vec![MxArray::from_value("b").unwrap(), MxArray::from_value(&1.0).unwrap()];
        let err = InputArguments::new(&inputs, 0, &["a"]).unwrap_err();
        assert!(err.to_string().contains("Invalid option name: 'b'."));
    }

    #[test]
    fn a_trailing_struct_holds_options() {
        let mut config = MxArray::structure(&["Alpha"], 1, 1).unwrap();
        config.set_field("Alpha", &0.5, 0).unwrap();
        let inputs = vec![MxArray::from_value("x").unwrap(), config];

        let args = InputArguments::new(&inputs, 1, &["alpha", "beta"]).unwrap();
        assert_eq!(args.get_as::<String>(0).unwrap(), "x");
        assert_eq!(args.option_or("alpha", 0.0).unwrap(), 0.5);
        assert!(args.option("beta").unwrap().is_none());
    }

    #[test]
    fn signatures_are_matched_by_shape() {
        let inputs = vec![MxArray::from_value(&1.0).unwrap(), MxArray::from_value(&2.0).unwrap()];

        let mut args = InputArguments::default();
        args.define("one", 1, &[]).define("two", 2, &[]);
        args.parse(&inputs).unwrap();
        assert!(!args.is("one"));
        assert!(args.is("two"));
        assert_eq!(args.get_as::<f64>(1).unwrap(), 2.0);

        let mut args = InputArguments::default();
        assert!(args.parse(&inputs).is_err());
    }

    #[test]
    fn output_counts_are_bounded() {
        let mut outputs = Outputs::new(2);
        assert!(OutputArguments::new(&mut outputs, 1, 0).is_err());
        assert!(OutputArguments::new(&mut outputs, 3, 3).is_err());

        let mut outputs = Outputs::new(1);
        let mut args = OutputArguments::new(&mut outputs, 2, 1).unwrap();
        args.assign(0, &1.0).unwrap();
        assert_eq!(
            args.assign(1, &1.0).unwrap_err().identifier(),
            "mexrs:arguments:error"
        );
        assert!(args.get(0).unwrap().is_some());
        assert!(args.get(1).is_err());
    }
}
