//! Tests for column classification

use rstest::rstest;

use shortlist::domain::{classify_column, ColumnKind, Dataset, Record, Schema, Value};

fn column_of(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .map(|v| Record::new().with("col", v))
        .collect()
}

#[rstest]
#[case::all_numbers(vec![Value::Number(1.0), Value::Number(2.0)], ColumnKind::Numeric)]
#[case::one_stray_number(vec![Value::from("n/a"), Value::Number(8.0), Value::from("x")], ColumnKind::Numeric)]
#[case::number_beats_bool(vec![Value::Bool(true), Value::Number(0.0)], ColumnKind::Numeric)]
#[case::bools_and_text(vec![Value::Bool(true), Value::from("yes")], ColumnKind::Boolean)]
#[case::only_text(vec![Value::from("M3"), Value::from("M4")], ColumnKind::Categorical)]
#[case::only_absent(vec![Value::Absent, Value::Absent], ColumnKind::Categorical)]
#[case::empty(vec![], ColumnKind::Categorical)]
fn given_column_values_when_classifying_then_any_row_rule_applies(
    #[case] values: Vec<Value>,
    #[case] expected: ColumnKind,
) {
    // Arrange
    let records = column_of(values);

    // Act
    let kind = classify_column(&records, "col");

    // Assert
    assert_eq!(kind, expected);
}

#[test]
fn given_dataset_when_classifying_schema_then_follows_column_order() {
    // Arrange
    let records = vec![
        Record::new()
            .with("name", "MacBook Air")
            .with("price_inr", 114900.0)
            .with("cellular", false),
        Record::new()
            .with("name", "iPad Pro")
            .with("price_inr", 99900.0)
            .with("cellular", true),
    ];
    let dataset = Dataset::new(
        vec!["name".into(), "price_inr".into(), "cellular".into()],
        records,
    );

    // Act
    let schema = Schema::classify(&dataset);

    // Assert
    let kinds: Vec<(&str, ColumnKind)> = schema.iter().map(|c| (c.name.as_str(), c.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("name", ColumnKind::Categorical),
            ("price_inr", ColumnKind::Numeric),
            ("cellular", ColumnKind::Boolean),
        ]
    );
    assert_eq!(schema.kind_of("missing"), None);
}
