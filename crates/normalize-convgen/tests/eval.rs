//! Running compiled plans with the reference interpreter.

use normalize_convgen::config::{Affix, FuncRef};
use normalize_convgen::{
    Compiler, ConversionModule, Directive, EvalError, Interpreter, Output, Pos, Primitive,
    Request, Runtime, Type, Universe, Value,
};

/// Parses strings into integers; everything else is unavailable.
struct Parser;

impl Runtime for Parser {
    fn call(&self, func: &str, value: Value) -> Result<Value, String> {
        match (func, value) {
            ("parseInt", Value::Str(s)) => s.parse().map(Value::Int).map_err(|e| e.to_string()),
            (func, _) => Err(format!("function {func} is not available")),
        }
    }

    fn getter(&self, owner: &Value, method: &str) -> Result<Value, String> {
        let Value::Record(fields) = owner else {
            return Err("not a record".into());
        };
        let field = method.trim_start_matches("Get");
        fields
            .get(field)
            .cloned()
            .ok_or_else(|| format!("no field {field}"))
    }
}

fn universe() -> Universe {
    Universe::builder()
        .scope("a", |s| {
            s.record("Node", |r| {
                r.field("Value", "int32").field("Next", "*a.Node");
            })
            .record("Bag", |r| {
                r.field("Tags", "[string]")
                    .field("Counts", "{string: int32}")
                    .field("Code", "string");
            })
            .record("Account", |r| {
                r.getter("GetCode", "string");
            })
            .enumeration("Color", Primitive::Int, &["Red", "Green", "Blue"])
            .union("Shape", |u| {
                u.method("Area", &[], Some("float64"));
            })
            .record("Circle", |r| {
                r.field("R", "float64").method("Area", &[], Some("float64"));
            })
            .record("Square", |r| {
                r.field("Side", "float64")
                    .pointer_method("Area", &[], Some("float64"));
            })
            .record("Triangle", |r| {
                r.field("Base", "float64").method("Area", &[], Some("float64"));
            });
        })
        .scope("b", |s| {
            s.record("Node", |r| {
                r.field("Value", "int64").field("Next", "*b.Node");
            })
            .record("Bag", |r| {
                r.field("Tags", "[string]")
                    .field("Counts", "{string: int64}")
                    .field("Code", "int64");
            })
            .record("Account", |r| {
                r.field("Code", "int64");
            })
            .enumeration("Color", Primitive::String, &["Red", "Green", "Unknown"])
            .union("Shape", |u| {
                u.method("Area", &[], Some("float64"));
            })
            .record("Circle", |r| {
                r.field("R", "float64").method("Area", &[], Some("float64"));
            })
            .record("Square", |r| {
                r.field("Side", "float64")
                    .pointer_method("Area", &[], Some("float64"));
            });
        })
        .build()
        .unwrap()
}

fn parse_int(fallible: bool) -> Directive {
    Directive::Import(FuncRef {
        name: "parseInt".into(),
        source: Primitive::String.into(),
        target: Primitive::Int64.into(),
        fallible,
        at: Pos::NONE,
    })
}

fn compile(universe: &Universe, module: ConversionModule) -> Output {
    Compiler::new(universe).module(module).compile().unwrap()
}

fn named(scope: &str, name: &str) -> Type {
    Type::named(scope, name)
}

// ============================================================================
// Records
// ============================================================================

mod records {
    use super::*;

    #[test]
    fn linked_list_through_self_call() {
        let universe = universe();
        let module = ConversionModule::new("").request(Request::record(
            "NodeToNode",
            named("a", "Node"),
            named("b", "Node"),
        ));
        let output = compile(&universe, module);
        let interp = Interpreter::new(&output, &universe, &Parser);

        let list = Value::record([
            ("Value", Value::Int(1)),
            (
                "Next",
                Value::ptr(Value::record([("Value", Value::Int(2)), ("Next", Value::Nil)])),
            ),
        ]);
        let converted = interp.convert("NodeToNode", list.clone()).unwrap();
        assert_eq!(converted, list);
    }

    #[test]
    fn collections_keep_emptiness() {
        let universe = universe();
        let module = ConversionModule::new("")
            .directive(parse_int(false), Pos::NONE)
            .request(Request::record("BagToBag", named("a", "Bag"), named("b", "Bag")));
        let output = compile(&universe, module);
        let interp = Interpreter::new(&output, &universe, &Parser);

        let bag = Value::record([
            ("Tags", Value::Seq(None)),
            ("Counts", Value::map([])),
            ("Code", Value::from("7")),
        ]);
        let converted = interp.convert("BagToBag", bag).unwrap();
        assert_eq!(
            converted,
            Value::record([
                ("Tags", Value::Seq(None)),
                ("Counts", Value::Map(Some(vec![]))),
                ("Code", Value::Int(7)),
            ])
        );

        let bag = Value::record([
            ("Tags", Value::seq([Value::from("x")])),
            ("Counts", Value::map([(Value::from("k"), Value::Int(3))])),
            ("Code", Value::from("0")),
        ]);
        let converted = interp.convert("BagToBag", bag).unwrap();
        assert_eq!(
            converted,
            Value::record([
                ("Tags", Value::seq([Value::from("x")])),
                ("Counts", Value::map([(Value::from("k"), Value::Int(3))])),
                ("Code", Value::Int(0)),
            ])
        );
    }

    #[test]
    fn failures_pass_through_wrappers() {
        let universe = universe();
        let module = ConversionModule::new("")
            .directive(parse_int(true), Pos::NONE)
            .directive(Directive::ErrWrap("annotate".into()), Pos::NONE)
            .request(Request::record_errorful(
                "BagToBag",
                named("a", "Bag"),
                named("b", "Bag"),
            ));
        let output = compile(&universe, module);
        let interp = Interpreter::new(&output, &universe, &Parser);

        let bag = Value::record([
            ("Tags", Value::Seq(None)),
            ("Counts", Value::Map(None)),
            ("Code", Value::from("seven")),
        ]);
        let err = interp.convert("BagToBag", bag).unwrap_err();
        assert!(matches!(err, EvalError::Wrapped { .. }));
        assert_eq!(
            err.to_string(),
            "annotate: parseInt: invalid digit found in string"
        );
    }

    #[test]
    fn getters_are_read_through_the_runtime() {
        let universe = universe();
        let getters = Directive::DiscoverGetters(Affix {
            prefix: "Get".into(),
            suffix: String::new(),
        });
        let module = ConversionModule::new("")
            .directive(parse_int(false), Pos::NONE)
            .directive(getters, Pos::NONE)
            .request(Request::record(
                "AccountToAccount",
                named("a", "Account"),
                named("b", "Account"),
            ));
        let output = compile(&universe, module);
        let interp = Interpreter::new(&output, &universe, &Parser);
        let account = Value::record([("Code", Value::from("12"))]);
        assert_eq!(
            interp.convert("AccountToAccount", account).unwrap(),
            Value::record([("Code", Value::Int(12))])
        );
    }

    #[test]
    fn unknown_conversion() {
        let (universe, output) = (universe(), Output::default());
        let interp = Interpreter::new(&output, &universe, &Parser);
        let err = interp.convert("Missing", Value::Nil).unwrap_err();
        assert_eq!(err, EvalError::UnknownConversion("Missing".into()));
    }
}

// ============================================================================
// Switches
// ============================================================================

mod switches {
    use super::*;

    fn colors(errorful: bool) -> Output {
        let universe = universe();
        let (x, y) = (named("a", "Color"), named("b", "Color"));
        let request = if errorful {
            Request::enumeration_errorful("ToColor", x, y, "Unknown")
        } else {
            Request::enumeration("ToColor", x, y, "Unknown")
        };
        let skip = Directive::Skip {
            x: Some("Blue".into()),
            y: None,
        };
        compile(
            &universe,
            ConversionModule::new("").request(request.directive(skip, Pos::NONE)),
        )
    }

    #[test]
    fn enum_default_member() {
        let universe = universe();
        let output = colors(false);
        let interp = Interpreter::new(&output, &universe, &Parser);
        assert_eq!(
            interp.convert("ToColor", Value::member("Green")).unwrap(),
            Value::member("Green")
        );
        assert_eq!(
            interp.convert("ToColor", Value::member("Blue")).unwrap(),
            Value::member("Unknown")
        );
    }

    #[test]
    fn errorful_enum_reports_misses() {
        let universe = universe();
        let output = colors(true);
        assert!(output.conversions[0].fallible);
        let interp = Interpreter::new(&output, &universe, &Parser);
        let err = interp.convert("ToColor", Value::member("Blue")).unwrap_err();
        assert_eq!(err.to_string(), "no member matches Blue");
    }

    fn shapes(errorful: bool) -> Output {
        let universe = universe();
        let (x, y) = (named("a", "Shape"), named("b", "Shape"));
        let request = if errorful {
            Request::union_errorful("ToShape", x, y)
        } else {
            Request::union("ToShape", x, y)
        };
        let skip = Directive::Skip {
            x: Some("Triangle".into()),
            y: None,
        };
        compile(
            &universe,
            ConversionModule::new("").request(request.directive(skip, Pos::NONE)),
        )
    }

    #[test]
    fn union_variants_are_converted() {
        let universe = universe();
        let output = shapes(false);
        let interp = Interpreter::new(&output, &universe, &Parser);

        let radius = || Value::record([("R", Value::Float(2.0))]);
        let circle = Value::variant(named("a", "Circle"), radius());
        assert_eq!(
            interp.convert("ToShape", circle).unwrap(),
            Value::variant(named("b", "Circle"), radius())
        );

        let square = Value::variant(
            Type::pointer(named("a", "Square")),
            Value::ptr(Value::record([("Side", Value::Float(3.0))])),
        );
        assert_eq!(
            interp.convert("ToShape", square).unwrap(),
            Value::variant(
                Type::pointer(named("b", "Square")),
                Value::ptr(Value::record([("Side", Value::Float(3.0))])),
            )
        );

        assert_eq!(interp.convert("ToShape", Value::Nil).unwrap(), Value::Nil);
    }

    #[test]
    fn unmatched_variants() {
        let universe = universe();
        let triangle = || {
            Value::variant(
                named("a", "Triangle"),
                Value::record([("Base", Value::Float(1.0))]),
            )
        };

        let output = shapes(false);
        let interp = Interpreter::new(&output, &universe, &Parser);
        assert_eq!(interp.convert("ToShape", triangle()).unwrap(), Value::Nil);

        let output = shapes(true);
        let interp = Interpreter::new(&output, &universe, &Parser);
        let err = interp.convert("ToShape", triangle()).unwrap_err();
        assert_eq!(
            err,
            EvalError::NoMatch {
                what: "variant",
                value: "a.Triangle".into(),
            }
        );
    }
}
