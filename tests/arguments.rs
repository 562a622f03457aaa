mod util;

mod tests {
    use mexrs::prelude::*;

    use super::util::warnings;

    fn values(values: &[f64]) -> Vec<MxArray<'static>> {
        values
            .iter()
            .map(|v| MxArray::from_value(v).unwrap())
            .collect()
    }

    fn options_as_pairs() {
        let mut inputs = values(&[1.0, 2.0]);
        inputs.push(MxArray::from_value("Tolerance").unwrap());
        inputs.push(MxArray::from_value(&0.01).unwrap());

        let args = InputArguments::new(&inputs, 2, &["tolerance", "maxIter"]).unwrap();
        assert_eq!(args.get_as::<f64>(0).unwrap(), 1.0);
        assert_eq!(args.get_as::<i32>(1).unwrap(), 2);
        assert_eq!(args.option_or("TOLERANCE", 1.0).unwrap(), 0.01);
        assert_eq!(args.option_or("maxiter", 100u32).unwrap(), 100);
        assert!(args.option("maxIter").unwrap().is_none());
        assert_eq!(
            args.option("verbose").unwrap_err().identifier(),
            "mexrs:arguments:error"
        );
        assert!(args.get(2).is_err());
        assert!(warnings().is_empty());
    }

    fn options_as_a_struct() {
        let mut config = MxArray::structure(&["maxIter"], 1, 1).unwrap();
        config.set_field("maxIter", &50i32, 0).unwrap();
        let mut inputs = values(&[1.0]);
        inputs.push(config);

        let args = InputArguments::new(&inputs, 1, &["tolerance", "maxIter"]).unwrap();
        assert_eq!(args.option_or("maxIter", 100i32).unwrap(), 50);
        assert!(args.option("tolerance").unwrap().is_none());

        let mut config = MxArray::structure(&["unknown"], 1, 1).unwrap();
        config.set_field("unknown", &1.0, 0).unwrap();
        let inputs = vec![config];
        let err = InputArguments::new(&inputs, 0, &["tolerance"]).unwrap_err();
        assert!(err.to_string().contains("Invalid option name: 'unknown'."));
    }

    fn option_names_are_validated() {
        let long = "x".repeat(65);
        let inputs = vec![
            MxArray::from_value(long.as_str()).unwrap(),
            MxArray::from_value(&1.0).unwrap(),
        ];
        let err = InputArguments::new(&inputs, 0, &["x"]).unwrap_err();
        assert!(err.to_string().contains("Option name too long"));

        let inputs = values(&[1.0, 2.0]);
        let err = InputArguments::new(&inputs, 1, &["x"]).unwrap_err();
        assert!(err
            .to_string()
            .contains("Option name must be char but is given double."));
    }

    fn repeated_options_warn() {
        let inputs = vec![
            MxArray::from_value("a").unwrap(),
            MxArray::from_value(&1.0).unwrap(),
            MxArray::from_value("A").unwrap(),
            MxArray::from_value(&2.0).unwrap(),
        ];

        let args = InputArguments::new(&inputs, 0, &["a"]).unwrap();
        assert_eq!(args.option_or("a", 0.0).unwrap(), 2.0);
        assert_eq!(warnings(), vec!["Option 'A' appeared more than once."]);
    }

    fn signatures() {
        let inputs = values(&[1.0]);
        let mut args = InputArguments::default();
        args.define("point", 1, &[]).define("range", 2, &[]);
        args.parse(&inputs).unwrap();
        assert!(args.is("point"));
        assert!(!args.is("range"));

        let mut args = InputArguments::default();
        args.define("x", 1, &["opt"]).define("y", 1, &["OPT"]);
        args.parse(&inputs).unwrap();
        assert!(args.is("x") && args.is("y"));
        assert_eq!(
            warnings(),
            vec!["Input arguments match more than one signature."]
        );

        let mut args = InputArguments::default();
        args.define("x", 1, &[]).define("y", 1, &[]);
        args.parse_with(&inputs, true).unwrap();
        assert!(warnings().is_empty());

        let mut args = InputArguments::default();
        args.define("pair", 2, &[]).define("triple", 3, &[]);
        let err = args.parse(&inputs).unwrap_err();
        assert!(err.to_string().contains("Too few arguments: 1 for at least"));
        assert!(!args.is("pair"));
    }

    fn output_counts() {
        let mut outputs = Outputs::new(3);
        let err = OutputArguments::new(&mut outputs, 2, 0).unwrap_err();
        assert!(err.to_string().contains("too many output: 3 for 2"));
        assert!(OutputArguments::new(&mut outputs, 5, 4).is_err());

        let mut args = OutputArguments::new(&mut outputs, 3, 1).unwrap();
        assert_eq!(args.len(), 3);
        args.assign(2, "last").unwrap();
        assert!(args.assign(3, "beyond").is_err());
        args.set(3, "dropped").unwrap();
        assert!(args.get(1).unwrap().is_none());
        assert_eq!(args.get(2).unwrap().unwrap().to::<String>().unwrap(), "last");

        assert!(outputs.expect(3, 3).is_ok());
        assert!(outputs.expect(1, 0).is_err());
        assert!(outputs.get(3).is_none());
    }

    #[test]
    fn argument_tests() {
        options_as_pairs();
        options_as_a_struct();
        option_names_are_validated();
        repeated_options_warn();
        signatures();
        output_counts();
    }
}
