#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::expression::{
        Concat, Get, GetArgument, HasBlock, HasBlockParams, Helper, Ref, RefHead, Unknown, Value,
    };
    use crate::test_support::{strings, MockLookup};
    use crate::*;
    use serde_json::json;

    fn compile(
        expression: Expression,
        lookup: &MockLookup,
        env: &StaticEnvironment,
    ) -> Result<CompiledExpression> {
        let table = SymbolTable::for_entry_point();
        expression.compile(lookup, env, &table)
    }

    #[test]
    fn test_value_compiles_to_itself() {
        let env = StaticEnvironment::new();
        let compiled = compile(Value::build("hi").into(), &MockLookup::new(), &env).unwrap();
        assert!(matches!(compiled, CompiledExpression::Value(ref v) if v == &json!("hi")));
    }

    #[test]
    fn test_ref_build_splits_head() {
        let reference = Ref::build("this.x.y");
        assert_eq!(reference.head, RefHead::This);
        assert_eq!(reference.tail, strings(&["x", "y"]));
        assert_eq!(reference.parts(), strings(&["x", "y"]));
        assert_eq!(reference.display(), "this.x.y");

        let reference = Ref::build("a.b");
        assert_eq!(reference.head, RefHead::Name("a".to_string()));
        assert_eq!(reference.parts(), strings(&["a", "b"]));
    }

    #[test]
    fn test_this_path_is_self_lookup() {
        let env = StaticEnvironment::new();
        let lookup = MockLookup::new().with_local("x", 3);
        let compiled = compile(Get::build("this.x.y").into(), &lookup, &env).unwrap();

        // `this.` wins over a local of the same name.
        assert_eq!(compiled.to_string(), "self.x.y");
    }

    #[test]
    fn test_local_head_shadows_self() {
        let env = StaticEnvironment::new();
        let lookup = MockLookup::new().with_local("a", 2);
        let compiled = compile(Get::build("a.b.c").into(), &lookup, &env).unwrap();

        match &compiled {
            CompiledExpression::LocalLookup { symbol, path, debug } => {
                assert_eq!(*symbol, Some(Symbol(2)));
                assert_eq!(path, &strings(&["b", "c"]));
                assert_eq!(debug, "a");
            }
            other => panic!("expected local lookup, got {:?}", other),
        }
        assert_eq!(compiled.to_string(), "$2.b.c");
    }

    #[test]
    fn test_unbound_head_reads_self() {
        let env = StaticEnvironment::new();
        let compiled = compile(Get::build("x.y").into(), &MockLookup::new(), &env).unwrap();
        assert_eq!(compiled.to_string(), "self.x.y");
    }

    #[test]
    fn test_unknown_prefers_registered_helper() {
        let env = StaticEnvironment::new().with_helper("foo");
        let lookup = MockLookup::new().with_local("foo", 1);
        let compiled = compile(Unknown::build("foo").into(), &lookup, &env).unwrap();

        match compiled {
            CompiledExpression::Helper { name, args, .. } => {
                assert_eq!(name, strings(&["foo"]));
                assert!(args.is_empty_singleton());
            }
            other => panic!("expected helper, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_without_helper_matches_get() {
        let env = StaticEnvironment::new();
        let lookup = MockLookup::new().with_local("a", 5);

        let unknown = compile(Unknown::build("a.b").into(), &lookup, &env).unwrap();
        let get = compile(Get::build("a.b").into(), &lookup, &env).unwrap();
        assert_eq!(unknown.to_string(), get.to_string());
        assert_eq!(unknown.to_json(), get.to_json());
    }

    #[test]
    fn test_unknown_this_path_never_calls_helper() {
        let env = StaticEnvironment::new().with_helper("foo");
        let lookup = MockLookup::new();
        let compiled = compile(Unknown::build("this.foo").into(), &lookup, &env).unwrap();
        assert_eq!(compiled.kind(), "self-lookup");
    }

    #[test]
    fn test_helper_compiles_args() {
        let env = StaticEnvironment::new().with_helper("if");
        let lookup = MockLookup::new().with_local("cond", 1);
        let helper = Helper::build(
            "if",
            PositionalArgs::build(vec![Get::build("cond").into(), Value::build("yes").into()]),
            NamedArgs::build(strings(&["else"]), vec![Value::build("no").into()]),
        );

        let compiled = compile(helper.into(), &lookup, &env).unwrap();
        match &compiled {
            CompiledExpression::Helper { args, helper, .. } => {
                assert_eq!(*helper, HelperId(0));
                assert_eq!(args.positional().len(), 2);
                assert_eq!(args.named().keys(), &strings(&["else"])[..]);
            }
            other => panic!("expected helper, got {:?}", other),
        }
        assert_eq!(compiled.to_string(), "(if $1 \"yes\" else=\"no\")");
    }

    #[test]
    fn test_unregistered_helper_fails() {
        let env = StaticEnvironment::new();
        let helper = Helper::build("missing", PositionalArgs::empty(), NamedArgs::empty());
        let err = compile(helper.into(), &MockLookup::new(), &env).unwrap_err();

        assert_eq!(
            err,
            CompileError::UnknownHelper {
                path: "missing".to_string()
            }
        );
        assert_eq!(err.to_string(), "Compile Error: missing is not a helper");
        assert_eq!(err.code(), "OC-ERR-HELPER");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_helper_name_checked_before_args() {
        let env = StaticEnvironment::new();
        let inner = Helper::build("inner", PositionalArgs::empty(), NamedArgs::empty());
        let params = PositionalArgs::build(vec![inner.into()]);
        let outer = Helper::build("outer", params, NamedArgs::empty());

        let err = compile(outer.into(), &MockLookup::new(), &env).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownHelper {
                path: "outer".to_string()
            }
        );
    }

    #[test]
    fn test_this_headed_helper_fails() {
        let env = StaticEnvironment::new().with_helper("foo");
        let helper = Helper::build("this.foo", PositionalArgs::empty(), NamedArgs::empty());
        let err = compile(helper.into(), &MockLookup::new(), &env).unwrap_err();
        assert_eq!(err.to_string(), "Compile Error: this.foo is not a helper");
    }

    #[test]
    fn test_get_argument_uses_named_symbol() {
        let env = StaticEnvironment::new();
        let lookup = MockLookup::new()
            .with_named("title", 7)
            .with_local("title", 1);
        let compiled = compile(GetArgument::build("title.length").into(), &lookup, &env).unwrap();
        assert_eq!(compiled.to_string(), "$7.length");
    }

    #[test]
    fn test_has_block_resolves_block_symbol() {
        let env = StaticEnvironment::new();
        let lookup = MockLookup::new().with_block("default", 3);

        let compiled = compile(HasBlock::build("default").into(), &lookup, &env).unwrap();
        assert_eq!(compiled.to_string(), "has-block(default $3)");

        let compiled = compile(HasBlockParams::build("inverse").into(), &lookup, &env).unwrap();
        assert_eq!(compiled.to_string(), "has-block-params(inverse $?)");
    }

    #[test]
    fn test_concat_compiles_parts_in_order() {
        let env = StaticEnvironment::new();
        let concat = Concat::build(vec![Value::build("a-").into(), Get::build("this.b").into()]);
        let compiled = compile(concat.into(), &MockLookup::new(), &env).unwrap();
        assert_eq!(compiled.to_string(), "(concat \"a-\" self.b)");
    }

    #[test]
    fn test_expression_kinds() {
        assert_eq!(Expression::from(Get::build("a")).kind(), "get");
        assert_eq!(Expression::from(Unknown::build("a")).kind(), "unknown");
        assert_eq!(
            Expression::from(GetArgument::build("a")).kind(),
            "get-argument"
        );
        assert_eq!(Expression::from(Value::build(1)).kind(), "value");
    }
}
