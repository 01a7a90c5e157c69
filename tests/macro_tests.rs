use dx_format::{dx, human, llm, DocumentBuilder, DxSection, DxValue};

#[test]
fn test_dx_macro_scalars() {
    assert_eq!(dx!(null), DxValue::Null);
    assert_eq!(dx!(true), DxValue::Bool(true));
    assert_eq!(dx!(false), DxValue::Bool(false));
    assert_eq!(dx!(42), DxValue::Number(42.0));
    assert_eq!(dx!(-123), DxValue::Number(-123.0));
    assert_eq!(dx!(0.5), DxValue::Number(0.5));
    assert_eq!(dx!("hello world"), DxValue::String("hello world".to_string()));
    assert_eq!(dx!(""), DxValue::String(String::new()));
}

#[test]
fn test_dx_macro_from_variables() {
    let name = String::from("dx");
    let port: u32 = 8080;
    let missing: Option<i64> = None;

    assert_eq!(dx!(name), DxValue::from("dx"));
    assert_eq!(dx!(port), DxValue::Number(8080.0));
    assert_eq!(dx!(missing), DxValue::Null);
    assert_eq!(dx!(Some(3)), DxValue::Number(3.0));
}

#[test]
fn test_dx_macro_refs() {
    assert_eq!(dx!(^"js"), DxValue::Ref("js".to_string()));

    let key = String::from("python");
    assert_eq!(dx!(^key), DxValue::Ref("python".to_string()));
}

#[test]
fn test_dx_macro_nested_arrays() {
    assert_eq!(dx!([]), DxValue::Array(vec![]));
    assert_eq!(
        dx!([1, "two", [null, false], []]),
        DxValue::Array(vec![
            DxValue::Number(1.0),
            DxValue::from("two"),
            DxValue::Array(vec![DxValue::Null, DxValue::Bool(false)]),
            DxValue::Array(vec![]),
        ])
    );
    assert_eq!(dx!([true, false,]), dx!([true, false]));
}

#[test]
fn test_dx_macro_builds_documents() {
    let mut builder = DocumentBuilder::new();
    builder.context("nm", dx!("dx"));
    builder.context("tl", dx!(["cargo", "rustc"]));
    let mut section = DxSection::new("r", vec!["ed".into(), "wk".into()]);
    section.push_row(vec![dx!(2021), dx!(true)]).unwrap();
    builder.section(section);
    let doc = builder.build();

    assert_eq!(llm::to_string(&doc), "#c:nm|dx;tl|*cargo,rustc\n#r(ed|wk)\n2021|+");
    assert_eq!(human::from_str(&human::to_string(&doc)).unwrap(), doc);
}
