//! Tests for the arena-backed display tree shared by both tree kinds

use shortlist::domain::{
    build_exploration_tree, build_regression_tree, score_records, BuildOptions, ColumnKind,
    Direction, Feature, NodeData, Record, ScoredRecord, TreeArena, Tradeoff,
};

fn scored(name: &str, score: f64) -> ScoredRecord {
    ScoredRecord {
        index: 0,
        record: Record::new().with("name", name),
        score,
        contributions: Vec::new(),
        top_factor: None,
    }
}

fn exploration_display() -> TreeArena {
    let records = vec![
        scored("a", 10.0),
        scored("b", 30.0),
        scored("c", 20.0),
        scored("d", 40.0),
    ];
    let root = build_exploration_tree(&records).unwrap();
    TreeArena::from_exploration(&root, Some("name"))
}

fn priced_devices() -> Vec<ScoredRecord> {
    let records: Vec<Record> = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0]
        .into_iter()
        .enumerate()
        .map(|(i, p)| Record::new().with("name", format!("device-{}", i)).with("price", p))
        .collect();
    let tradeoffs =
        vec![Tradeoff::new("price", ColumnKind::Numeric, 1.0, Direction::LowerIsBetter).unwrap()];
    score_records(&records, &tradeoffs)
}

#[test]
fn given_exploration_tree_when_traversing_then_visits_pre_and_post_order() {
    // Arrange
    let display = exploration_display();

    // Act
    let pre: Vec<&str> = display.iter().map(|(_, n)| n.id.as_str()).collect();
    let post: Vec<&str> = display.iter_postorder().map(|(_, n)| n.id.as_str()).collect();

    // Assert
    assert_eq!(pre, ["explore-1", "explore-0", "explore-2", "explore-3"]);
    assert_eq!(post, ["explore-0", "explore-3", "explore-2", "explore-1"]);
    assert_eq!(display.len(), 4);
    assert_eq!(display.depth(), 3);
}

#[test]
fn given_exploration_tree_when_converting_then_labels_edges_and_options() {
    // Arrange
    let display = exploration_display();

    // Act
    let nodes: Vec<_> = display.iter().map(|(_, n)| n).collect();
    let leaves: Vec<&str> = display.leaf_nodes().iter().map(|n| n.id.as_str()).collect();

    // Assert
    assert_eq!(nodes[0].edge, None);
    assert_eq!(nodes[1].edge, Some("lower"));
    assert_eq!(nodes[2].edge, Some("higher"));
    assert_eq!(nodes[3].edge, Some("higher"));
    assert_eq!(leaves, ["explore-0", "explore-3"]);
    match &nodes[0].data {
        NodeData::Choice { label, score, .. } => {
            assert_eq!(label, "c");
            assert_eq!(*score, 20.0);
        }
        other => panic!("expected an option, got {:?}", other),
    }
}

#[test]
fn given_missing_label_column_when_converting_then_falls_back_to_node_id() {
    let records = vec![scored("a", 1.0)];
    let root = build_exploration_tree(&records).unwrap();

    let display = TreeArena::from_exploration(&root, Some("model"));

    let (_, node) = display.iter().next().unwrap();
    assert!(matches!(&node.data, NodeData::Choice { label, .. } if label == "explore-0"));
}

#[test]
fn given_regression_tree_when_converting_then_decisions_ask_questions() {
    // Arrange
    let scored = priced_devices();
    let options = BuildOptions::new(1, 2, 1, "cart").unwrap();
    let tree = build_regression_tree(&scored, &[Feature::numeric("price")], &options).unwrap();

    // Act
    let display = TreeArena::from_regression(&tree, Some("name"));

    // Assert
    let nodes: Vec<_> = display.iter().map(|(_, n)| n).collect();
    assert_eq!(nodes[0].id, "cart-0");
    match &nodes[0].data {
        NodeData::Decision {
            question,
            factor,
            sample_count,
        } => {
            assert_eq!(question, "price <= 6.5?");
            assert_eq!(factor.as_deref(), Some("price"));
            assert_eq!(*sample_count, 6);
        }
        other => panic!("expected a decision, got {:?}", other),
    }

    let leaves = display.leaf_nodes();
    assert_eq!(leaves.len(), 2);
    assert_eq!(leaves[0].edge, Some("yes"));
    assert_eq!(leaves[1].edge, Some("no"));
    match &leaves[0].data {
        NodeData::Choice {
            label,
            predicted_score,
            ..
        } => {
            assert_eq!(label, "device-0", "cheapest device is the best member");
            assert!(predicted_score.is_some());
        }
        other => panic!("expected an option, got {:?}", other),
    }
}

#[test]
fn given_regression_display_when_rendering_then_text_contains_question_and_edges() {
    let scored = priced_devices();
    let options = BuildOptions::new(1, 2, 1, "cart").unwrap();
    let tree = build_regression_tree(&scored, &[Feature::numeric("price")], &options).unwrap();

    let rendered = TreeArena::from_regression(&tree, Some("name"))
        .to_termtree()
        .unwrap()
        .to_string();

    assert!(rendered.contains("price <= 6.5?"));
    assert!(rendered.contains("yes: device-0"));
    assert!(rendered.contains("no: device-3"));
}

#[test]
fn given_display_tree_when_serializing_then_nests_children_with_type_tags() {
    let scored = priced_devices();
    let options = BuildOptions::new(1, 2, 1, "cart").unwrap();
    let tree = build_regression_tree(&scored, &[Feature::numeric("price")], &options).unwrap();
    let display = TreeArena::from_regression(&tree, Some("name"));

    let json = serde_json::to_value(&display).unwrap();

    assert_eq!(json["type"], "decision");
    assert_eq!(json["question"], "price <= 6.5?");
    assert_eq!(json["sampleCount"], 6);
    assert_eq!(json["children"][0]["type"], "option");
    assert_eq!(json["children"][0]["edge"], "yes");
    assert_eq!(json["children"][1]["label"], "device-3");
}

#[test]
fn given_empty_arena_when_rendering_then_nothing_to_show() {
    let display = TreeArena::default();

    assert!(display.is_empty());
    assert_eq!(display.depth(), 0);
    assert!(display.to_termtree().is_none());
    assert_eq!(serde_json::to_value(&display).unwrap(), serde_json::Value::Null);
}
