//! Tests for the scoring engine and explainability helper

use rstest::rstest;

use shortlist::domain::{
    most_influential, score_records, ColumnKind, Direction, DomainError, Record, Tradeoff,
};

fn tradeoff(column: &str, weight: f64, direction: Direction) -> Tradeoff {
    Tradeoff::new(column, ColumnKind::Numeric, weight, direction).unwrap()
}

fn column(values: &[f64]) -> Vec<Record> {
    values
        .iter()
        .map(|v| Record::new().with("ram_gb", *v))
        .collect()
}

#[rstest]
#[case::higher_is_better(Direction::HigherIsBetter, 1.0)]
#[case::lower_is_better(Direction::LowerIsBetter, 1.0)]
#[case::heavy_weight(Direction::LowerIsBetter, 7.5)]
fn given_constant_column_when_scoring_then_everything_is_zero(
    #[case] direction: Direction,
    #[case] weight: f64,
) {
    // Arrange
    let records = column(&[1.0, 1.0, 1.0, 1.0]);
    let tradeoffs = vec![tradeoff("ram_gb", weight, direction)];

    // Act
    let scored = score_records(&records, &tradeoffs);

    // Assert
    assert_eq!(scored.len(), 4);
    for record in &scored {
        assert_eq!(record.score, 0.0);
        assert_eq!(record.contributions[0].normalized_value, 0.0);
        assert_eq!(record.contributions[0].directed_component, 0.0);
    }
}

#[test]
fn given_two_tradeoffs_when_scoring_then_sums_weighted_contributions_in_order() {
    // Arrange
    let records = vec![
        Record::new().with("ram_gb", 8.0).with("price_inr", 90000.0),
        Record::new().with("ram_gb", 16.0).with("price_inr", 115000.0),
        Record::new().with("ram_gb", 24.0).with("price_inr", 190000.0),
    ];
    let tradeoffs = vec![
        tradeoff("ram_gb", 2.0, Direction::HigherIsBetter),
        tradeoff("price_inr", 1.0, Direction::LowerIsBetter),
    ];

    // Act
    let scored = score_records(&records, &tradeoffs);

    // Assert
    let middle = &scored[1];
    assert_eq!(middle.contributions[0].column, "ram_gb");
    assert_eq!(middle.contributions[1].column, "price_inr");
    assert!((middle.contributions[0].normalized_value - 0.5).abs() < 1e-12);
    assert!((middle.contributions[0].weighted_contribution - 1.0).abs() < 1e-12);
    assert!((middle.contributions[1].normalized_value - 0.25).abs() < 1e-12);
    assert!((middle.contributions[1].directed_component - 0.75).abs() < 1e-12);
    assert!((middle.score - 1.75).abs() < 1e-12);
    assert_eq!(middle.top_factor.as_deref(), Some("ram_gb"));
    assert_eq!(scored[0].score, 1.0, "cheapest gets full price credit only");
}

#[test]
fn given_no_tradeoffs_when_scoring_then_scores_are_zero() {
    let scored = score_records(&column(&[8.0, 16.0]), &[]);
    assert!(scored.iter().all(|r| r.score == 0.0 && r.contributions.is_empty()));
    assert!(scored.iter().all(|r| r.top_factor.is_none()));
}

#[test]
fn given_empty_input_when_scoring_then_returns_nothing() {
    let tradeoffs = vec![tradeoff("ram_gb", 1.0, Direction::HigherIsBetter)];
    assert!(score_records(&[], &tradeoffs).is_empty());
}

#[test]
fn given_non_numeric_raw_value_when_scoring_then_contributes_nothing() {
    // Arrange
    let records = vec![
        Record::new().with("ram_gb", 8.0),
        Record::new().with("ram_gb", "unknown"),
        Record::new(),
        Record::new().with("ram_gb", 16.0),
    ];
    let tradeoffs = vec![tradeoff("ram_gb", 1.0, Direction::LowerIsBetter)];

    // Act
    let scored = score_records(&records, &tradeoffs);

    // Assert
    assert_eq!(scored[0].score, 1.0);
    assert_eq!(scored[1].score, 0.0);
    assert_eq!(scored[2].score, 0.0);
    assert_eq!(scored[3].score, 0.0);
}

#[rstest]
#[case::higher(Direction::HigherIsBetter)]
#[case::lower(Direction::LowerIsBetter)]
fn given_one_record_raised_when_scoring_then_score_moves_with_direction(
    #[case] direction: Direction,
) {
    // Arrange
    let tradeoffs = vec![tradeoff("ram_gb", 1.0, direction)];
    let probe_values = [0.0, 4.0, 8.0, 12.0, 16.0, 24.0, 40.0];

    // Act
    let scores: Vec<f64> = probe_values
        .iter()
        .map(|v| score_records(&column(&[*v, 8.0, 16.0, 32.0]), &tradeoffs)[0].score)
        .collect();

    // Assert
    for pair in scores.windows(2) {
        match direction {
            Direction::HigherIsBetter => assert!(pair[1] >= pair[0], "{:?}", scores),
            Direction::LowerIsBetter => assert!(pair[1] <= pair[0], "{:?}", scores),
        }
    }
}

#[test]
fn given_varied_columns_when_scoring_then_components_stay_in_unit_interval() {
    // Arrange
    let records: Vec<Record> = (0..25_i32)
        .map(|i| {
            Record::new()
                .with("ram_gb", f64::from((i * 7) % 11))
                .with("price_inr", f64::from(50000 + (i * 3301) % 9000))
        })
        .collect();
    let tradeoffs = vec![
        tradeoff("ram_gb", 0.7, Direction::HigherIsBetter),
        tradeoff("price_inr", 3.0, Direction::LowerIsBetter),
    ];

    // Act
    let scored = score_records(&records, &tradeoffs);

    // Assert
    for record in &scored {
        for c in &record.contributions {
            assert!((0.0..=1.0).contains(&c.normalized_value));
            assert!((0.0..=1.0).contains(&c.directed_component));
            assert!(c.weighted_contribution >= 0.0);
        }
    }
}

#[rstest]
#[case::negative(-1.0)]
#[case::nan(f64::NAN)]
#[case::infinite(f64::INFINITY)]
fn given_invalid_weight_when_building_tradeoff_then_rejects(#[case] weight: f64) {
    let result = Tradeoff::new("ram_gb", ColumnKind::Numeric, weight, Direction::HigherIsBetter);
    assert!(matches!(result, Err(DomainError::InvalidWeight { .. })));
}

#[test]
fn given_categorical_column_when_building_tradeoff_then_rejects() {
    let result = Tradeoff::new("chip", ColumnKind::Categorical, 1.0, Direction::HigherIsBetter);
    assert!(matches!(result, Err(DomainError::NonNumericTradeoff { .. })));
}

#[test]
fn given_scored_record_when_explaining_then_picks_largest_contribution() {
    // Arrange
    let records = vec![
        Record::new().with("ram_gb", 8.0).with("battery_hours", 10.0),
        Record::new().with("ram_gb", 16.0).with("battery_hours", 24.0),
    ];
    let tradeoffs = vec![
        tradeoff("ram_gb", 0.5, Direction::HigherIsBetter),
        tradeoff("battery_hours", 2.0, Direction::HigherIsBetter),
    ];

    // Act
    let scored = score_records(&records, &tradeoffs);
    let top = most_influential(&scored[1].contributions);

    // Assert
    assert_eq!(top.map(|c| c.column.as_str()), Some("battery_hours"));
}
