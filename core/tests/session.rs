use kaleido_core::ast::{Expr, FunctionDef, Item, Prototype};
use kaleido_core::session::ANON_EXPR_NAME;
use kaleido_core::{
    CodegenContext, CodegenOptions, ItemOutcome, Level, LowerErrorKind, MemorySink, Session, SessionError,
    generate_error_report, lower_items_to_ir,
};

fn program() -> Vec<Item> {
    vec![
        Item::Extern(Prototype::new("sqrt", ["x"])),
        Item::Function(FunctionDef::new(
            Prototype::new("foo", ["a", "b"]),
            Expr::binary(
                '+',
                Expr::variable("a"),
                Expr::binary('*', Expr::variable("b"), Expr::number(2.0)),
            ),
        )),
        Item::Expr(Expr::call("foo", vec![Expr::number(3.0), Expr::number(4.0)])),
        Item::Expr(Expr::call("sqrt", vec![Expr::number(16.0)])),
    ]
}

#[test]
fn items_are_handled_in_order() {
    let mut session = Session::new(CodegenContext::new());
    let results = session.handle_items(&program());
    assert_eq!(
        results,
        vec![
            Ok(ItemOutcome::Declared { name: "sqrt".into() }),
            Ok(ItemOutcome::Defined { name: "foo".into() }),
            Ok(ItemOutcome::Evaluated { value: 11.0 }),
            Ok(ItemOutcome::Evaluated { value: 4.0 }),
        ]
    );
    assert_eq!(session.module().len(), 2);
    assert!(session.module().lookup_function(ANON_EXPR_NAME).is_none());
}

#[test]
fn failures_are_reported_and_session_continues() {
    let sink = MemorySink::new();
    let mut session = Session::new(CodegenContext::new().with_diagnostics(sink.clone()));
    let items = vec![
        Item::Expr(Expr::variable("x")),
        Item::Expr(Expr::call("missing", vec![])),
        Item::Expr(Expr::number(1.0)),
    ];
    let results = session.handle_items(&items);
    assert!(matches!(&results[0], Err(SessionError::Lower(e)) if e.kind() == LowerErrorKind::UnknownVariable));
    assert!(matches!(&results[1], Err(SessionError::Lower(e)) if e.kind() == LowerErrorKind::UnknownFunction));
    assert_eq!(results[2], Ok(ItemOutcome::Evaluated { value: 1.0 }));
    assert_eq!(sink.len(), 2);
    assert!(sink.entries().iter().all(|d| d.level == Level::Error && d.issuer == "kaleido.lower"));
}

#[test]
fn execution_errors_go_to_the_sink() {
    let sink = MemorySink::new();
    let mut session = Session::new(CodegenContext::new().with_diagnostics(sink.clone()));
    session.handle_item(&Item::Extern(Prototype::new("mystery", ["x"]))).unwrap();
    let result = session.handle_item(&Item::Expr(Expr::call("mystery", vec![Expr::number(1.0)])));
    assert!(matches!(result, Err(SessionError::Exec(_))));
    assert_eq!(sink.entries()[0].issuer, "kaleido.exec");
    assert!(session.module().lookup_function(ANON_EXPR_NAME).is_none());
}

#[test]
fn evaluation_can_be_disabled() {
    let mut session = Session::new(CodegenContext::new()).with_evaluation(false);
    let outcome = session.handle_item(&Item::Expr(Expr::number(2.0))).unwrap();
    match outcome {
        ItemOutcome::Discarded { ir } => assert!(ir.contains(ANON_EXPR_NAME)),
        other => panic!("expected a discarded expression, got {:?}", other),
    }
    assert!(session.module().is_empty());
}

#[test]
fn lower_items_to_ir_keeps_definitions_only() {
    let module = lower_items_to_ir(&program(), CodegenOptions::default()).expect("lowered");
    let names: Vec<&str> = module.functions().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["sqrt", "foo"]);
    let text = module.to_string();
    assert!(text.contains("declare double @sqrt"));
    assert!(text.contains("define double @foo"));
}

#[test]
fn error_report_names_level_and_issuer() {
    let mut session = Session::new(CodegenContext::new().with_diagnostics(MemorySink::new()));
    let err = session.handle_item(&Item::Expr(Expr::variable("q"))).unwrap_err();
    let report = generate_error_report(&err);
    assert!(report.starts_with("KALEIDO | ERROR | kaleido.lower |"), "{}", report);
}
