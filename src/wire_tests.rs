#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::expression::RefHead;
    use crate::statement::{DynamicAttr, Yield};
    use crate::test_support::strings;
    use crate::*;
    use serde_json::{json, Value as Json};
    use std::sync::Arc;

    fn template(value: Json) -> SerializedTemplate {
        serde_json::from_value(value).unwrap()
    }

    fn scan(
        value: Json,
        env: &StaticEnvironment,
        options: CompileOptions,
    ) -> Result<Arc<InlineBlock>> {
        let template = template(value);
        StatementScanner::scan_template(env, &template, options)
    }

    fn kinds(block: &InlineBlock) -> Vec<&'static str> {
        block.statements.iter().map(Statement::kind).collect()
    }

    #[test]
    fn test_literals_decode_as_values() {
        for literal in [json!("s"), json!(1), json!(true), json!(null)] {
            let expression = Expression::from_spec(&literal).unwrap();
            assert_eq!(expression.kind(), "value");
        }
    }

    #[test]
    fn test_reference_paths() {
        match Expression::from_spec(&json!(["get", [null, "a"]])).unwrap() {
            Expression::Get(get) => {
                assert_eq!(get.reference.head, RefHead::This);
                assert_eq!(get.reference.tail, strings(&["a"]));
            }
            other => panic!("expected get, got {:?}", other),
        }

        match Expression::from_spec(&json!(["unknown", "a.b"])).unwrap() {
            Expression::Unknown(unknown) => {
                assert_eq!(unknown.reference.parts(), strings(&["a", "b"]));
            }
            other => panic!("expected unknown, got {:?}", other),
        }

        match Expression::from_spec(&json!(["arg", ["title"]])).unwrap() {
            Expression::GetArgument(argument) => assert_eq!(argument.parts, strings(&["title"])),
            other => panic!("expected arg, got {:?}", other),
        }
    }

    #[test]
    fn test_helper_call_decodes_params_and_hash() {
        let expression = Expression::from_spec(&json!([
            "helper",
            ["if"],
            [["get", ["cond"]], "yes"],
            [["else"], ["no"]]
        ]))
        .unwrap();

        match expression {
            Expression::Helper(helper) => {
                assert_eq!(helper.reference.parts(), strings(&["if"]));
                assert_eq!(helper.args.positional().len(), 2);
                assert_eq!(helper.args.named().keys(), &strings(&["else"])[..]);
            }
            other => panic!("expected helper, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_args_decode_to_singletons() {
        for spec in [Json::Null, json!([])] {
            let positional = PositionalArgs::from_spec(&spec).unwrap();
            assert!(positional.is_empty_singleton());
        }
        for spec in [Json::Null, json!([[], []])] {
            let named = NamedArgs::from_spec(&spec).unwrap();
            assert!(named.is_empty_singleton());
        }
        let args = Args::from_spec(&Json::Null, &json!([[], []])).unwrap();
        assert!(args.is_empty_singleton());
    }

    #[test]
    fn test_malformed_expressions() {
        let cases = [
            json!(["bogus", "x"]),
            json!({ "get": "x" }),
            json!([]),
            json!([1, 2]),
            json!(["get", 5]),
            json!(["concat", "x"]),
        ];
        for case in cases {
            let err = Expression::from_spec(&case).unwrap_err();
            assert_eq!(err.code(), "OC-ERR-SYNTAX", "{}", case);
        }
    }

    #[test]
    fn test_malformed_hash() {
        let err = NamedArgs::from_spec(&json!([["a", "a"], [1, 2]])).unwrap_err();
        assert!(matches!(err, CompileError::MalformedSyntax { ref kind, .. } if kind == "hash"));

        let err = NamedArgs::from_spec(&json!([["a", "b"], [1]])).unwrap_err();
        assert!(err.to_string().contains("2 keys but 1 values"));

        assert!(NamedArgs::from_spec(&json!({ "a": 1 })).is_err());
    }

    #[test]
    fn test_element_statements_decode_and_scan() {
        let env = StaticEnvironment::new();
        let block = scan(
            json!({
                "statements": [
                    ["text", "hello "],
                    ["open-element", "div", []],
                    ["static-attr", "class", "box", null],
                    ["dynamic-attr", "title", ["get", ["this", "t"]], null],
                    ["flush-element"],
                    ["append", ["unknown", ["name"]], false],
                    ["comment", "c"],
                    ["close-element"]
                ]
            }),
            &env,
            CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(
            kinds(&block),
            vec![
                "text",
                "open-primitive-element",
                "static-attr",
                "dynamic-attr",
                "flush-element",
                "optimized-append",
                "comment",
                "close-element"
            ]
        );
        assert!(block.children.is_empty());
    }

    #[test]
    fn test_deopt_appends_option() {
        let env = StaticEnvironment::new();
        let options = CompileOptions {
            deopt_appends: true,
            ..CompileOptions::default()
        };
        let input = json!({ "statements": [["append", "x", true]] });
        let block = scan(input, &env, options).unwrap();

        match &block.statements[0] {
            Statement::UnoptimizedAppend(append) => assert!(append.trusting_morph),
            other => panic!("expected unoptimized append, got {:?}", other),
        }
    }

    #[test]
    fn test_trusting_attr_decodes_as_dynamic_attr() {
        let env = StaticEnvironment::new();
        let block = scan(
            json!({ "statements": [["trusting-attr", "style", ["get", ["s"]], "ns"]] }),
            &env,
            CompileOptions::default(),
        )
        .unwrap();

        let expected = DynamicAttr::build(
            "style",
            Expression::from_spec(&json!(["get", ["s"]])).unwrap(),
            true,
            Some("ns"),
        );
        assert_eq!(block.statements, vec![Statement::DynamicAttr(expected)]);
    }

    #[test]
    fn test_block_statement_resolves_templates() {
        let env = StaticEnvironment::new();
        let block = scan(
            json!({
                "statements": [
                    ["block", ["each"], [["get", ["items"]]], null, 0, 1]
                ],
                "blocks": [
                    { "statements": [["append", ["get", ["item"]], false]], "locals": ["item"] },
                    { "statements": [["text", "empty"]] }
                ]
            }),
            &env,
            CompileOptions::default(),
        )
        .unwrap();

        let statement = match &block.statements[0] {
            Statement::Block(statement) => statement,
            other => panic!("expected block, got {:?}", other),
        };
        assert_eq!(statement.path, strings(&["each"]));
        assert_eq!(statement.args.positional().len(), 1);

        let default = statement.templates.default.as_ref().unwrap();
        assert_eq!(default.locals, strings(&["item"]));
        assert!(default.symbol_table.get_local("item").is_some());
        assert!(block.symbol_table.get_local("item").is_none());

        let inverse = statement.templates.inverse.as_ref().unwrap();
        assert_eq!(kinds(inverse), vec!["text"]);

        assert_eq!(block.children.len(), 2);
        assert!(Arc::ptr_eq(&block.children[0], default));
    }

    #[test]
    fn test_missing_block_id_is_internal() {
        let env = StaticEnvironment::new();
        let err = scan(
            json!({ "statements": [["block", ["if"], null, null, 3, null]] }),
            &env,
            CompileOptions::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            CompileError::Internal(InternalError::MissingBlock { id: 3 })
        );
    }

    #[test]
    fn test_yield_decodes_positional_params() {
        let env = StaticEnvironment::new();
        let block = scan(
            json!({ "statements": [["yield", "default", [1, ["get", ["this", "x"]]]]] }),
            &env,
            CompileOptions::default(),
        )
        .unwrap();

        match &block.statements[0] {
            Statement::Yield(Yield { to, args }) => {
                assert_eq!(to, "default");
                assert_eq!(args.positional().len(), 2);
                assert!(args.named().is_empty_singleton());
            }
            other => panic!("expected yield, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_statement_kind() {
        let env = StaticEnvironment::new();
        let err = scan(
            json!({ "statements": [["marquee", "x"]] }),
            &env,
            CompileOptions::default(),
        )
        .unwrap_err();
        match err {
            CompileError::MalformedSyntax { kind, .. } => assert_eq!(kind, "statement"),
            other => panic!("expected malformed syntax, got {:?}", other),
        }
    }

    #[test]
    fn test_component_without_close_is_unterminated() {
        let env = StaticEnvironment::new().with_component("my-card");
        let err = scan(
            json!({
                "statements": [
                    ["open-element", "my-card", []],
                    ["flush-element"],
                    ["text", "body"]
                ]
            }),
            &env,
            CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "OC-ERR-UNTERMINATED");
    }

    #[test]
    fn test_component_in_template_becomes_child_block() {
        let env = StaticEnvironment::new().with_component("my-card");
        let block = scan(
            json!({
                "statements": [
                    ["open-element", "my-card", ["item"]],
                    ["static-arg", "title", "T"],
                    ["flush-element"],
                    ["append", ["get", ["item"]], false],
                    ["close-element"],
                    ["text", "after"]
                ]
            }),
            &env,
            CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(kinds(&block), vec!["component", "text"]);
        assert_eq!(block.children.len(), 1);
        match &block.statements[0] {
            Statement::Component(component) => {
                assert!(Arc::ptr_eq(&component.template, &block.children[0]));
                assert_eq!(component.args.named().keys(), &strings(&["title"])[..]);
                assert!(component.attrs.is_empty());
            }
            other => panic!("expected component, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_component_argument_is_malformed() {
        let env = StaticEnvironment::new().with_component("my-card");
        let err = scan(
            json!({
                "statements": [
                    ["open-element", "my-card", []],
                    ["static-arg", "title", "a"],
                    ["dynamic-arg", "title", ["get", ["this", "t"]]],
                    ["flush-element"],
                    ["close-element"]
                ]
            }),
            &env,
            CompileOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.code(), "OC-ERR-SYNTAX");
        assert_eq!(
            err.to_string(),
            "Syntax Error: malformed component: duplicate parameter \"title\" on <my-card>"
        );
    }

    #[test]
    fn test_end_block_requires_an_open_block() {
        let env = StaticEnvironment::new();
        let table = SymbolTable::for_entry_point();
        let mut scanner = StatementScanner::new(&env, &[], table, CompileOptions::default());

        scanner.start_block(&strings(&["item"]));
        let block = scanner.end_block(&strings(&["item"])).unwrap();
        assert_eq!(block.locals, strings(&["item"]));

        let err = scanner.end_block(&[]).unwrap_err();
        assert_eq!(err, CompileError::Internal(InternalError::UnbalancedBlock));
        assert!(err.is_internal());
    }
}
