use serde_json::json;
use storyforge::types::*;

fn stage_with(versions: &[(&str, &str)], selected: &str) -> Stage {
    let mut stage = Stage::new("input");
    for (key, content) in versions {
        stage.output.insert(key.to_string(), content.to_string());
    }
    stage.selected = selected.to_string();
    stage
}

#[test]
fn stage_selected_output() {
    let stage = stage_with(&[("v1", "one"), ("v2", "two")], "v2");
    assert_eq!(stage.selected_output(), Some("two"));
}

#[test]
fn stage_without_selection_has_no_output() {
    let stage = stage_with(&[("v1", "one")], "");
    assert_eq!(stage.selected_output(), None);
}

#[test]
fn stage_with_dangling_selection_has_no_output() {
    let stage = stage_with(&[("v1", "one")], "v2");
    assert_eq!(stage.selected_output(), None);
}

#[test]
fn block_first_stage_follows_insertion_order() {
    let block = Block::new()
        .with_stage("summary", Stage::new("b"))
        .with_stage("raw", Stage::new("a"));

    let (name, stage) = block.first_stage().unwrap();
    assert_eq!(name, "summary");
    assert_eq!(stage.input, "b");
    assert!(block.stage("raw").is_some());
    assert!(block.stage("missing").is_none());
    assert!(Block::new().first_stage().is_none());
}

#[test]
fn block_serializes_as_stage_map() {
    let block = Block::new().with_stage("raw", stage_with(&[("v1", "x")], "v1"));
    let value = serde_json::to_value(&block).unwrap();
    assert_eq!(
        value,
        json!({ "raw": { "input": "input", "selected": "v1", "output": { "v1": "x" } } })
    );
}

#[test]
fn stage_order_survives_serde() {
    let json = r#"{ "zeta": {}, "alpha": {}, "mid": {} }"#;
    let block: Block = serde_json::from_str(json).unwrap();
    let names: Vec<&str> = block.stages.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert_eq!(block.stages["zeta"], Stage::default());
}

#[test]
fn empty_state_defaults() {
    let state = ProjectState::empty("Title", "Author");
    assert_eq!(state.storyforge, STORYFORGE_VERSION);
    assert_eq!(state.schema_version, SCHEMA_VERSION);
    assert_eq!(state.project.title, "Title");
    assert_eq!(state.settings.default_reference_mode, "summary");
    assert!(state.blocks.is_empty());
    assert_eq!(state.tree, TreeState::default());
}

#[test]
fn block_ref_ordering_and_display() {
    let a = BlockRef::new("chapter", "one", "draft");
    let b = BlockRef::new("chapter", "two", "draft");
    assert!(a < b);
    assert_eq!(a.to_string(), "chapter:one:draft");
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        json!({ "category": "chapter", "block": "one", "stage": "draft" })
    );
}
