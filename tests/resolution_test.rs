use proptest::prelude::*;
use storyforge::document::Project;
use storyforge::resolution::{find_references, ReferenceResolver};
use storyforge::types::*;

/// `character:alice` with stages `raw` (selected v1 = "Raw") and `summary`
/// (selected v1 = "Summary"), declared in that order.
fn setup_alice() -> Project {
    let mut project = Project::new("Test", "");
    project.create_block("character", "alice", None).unwrap();
    project.add_stage("character", "alice", "raw", "").unwrap();
    project
        .add_version("character", "alice", "raw", "v1", "Raw")
        .unwrap();
    project
        .select_version("character", "alice", "raw", "v1")
        .unwrap();
    project.add_stage("character", "alice", "summary", "").unwrap();
    project
        .add_version("character", "alice", "summary", "v1", "Summary")
        .unwrap();
    project
        .select_version("character", "alice", "summary", "v1")
        .unwrap();
    project
}

fn block_with_output(stage: &str, content: &str) -> Block {
    let mut s = Stage::new("");
    s.output.insert("v1".to_string(), content.to_string());
    s.selected = "v1".to_string();
    Block::new().with_stage(stage, s)
}

#[test]
fn test_all_forms_resolve_single_stage_block() {
    let mut project = Project::new("Test", "");
    project.create_block("character", "alice", None).unwrap();
    project
        .add_stage("character", "alice", "raw", "Create character")
        .unwrap();
    project
        .add_version("character", "alice", "raw", "v1", "Alice content")
        .unwrap();
    project
        .select_version("character", "alice", "raw", "v1")
        .unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[alice]"), Some("Alice content"));
    assert_eq!(resolver.resolve("[character:alice]"), Some("Alice content"));
    assert_eq!(
        resolver.resolve("[character:alice:raw]"),
        Some("Alice content")
    );
}

#[test]
fn test_bare_name_uses_first_declared_stage() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);

    assert_eq!(resolver.resolve("[alice]"), Some("Raw"));
    assert_eq!(resolver.resolve("[alice:summary]"), Some("Summary"));
    assert_eq!(resolver.resolve("[character:alice:summary]"), Some("Summary"));
}

#[test]
fn test_first_stage_is_insertion_order_not_alphabetical() {
    let mut project = Project::new("Test", "");
    let block = block_with_output("zeta", "Zeta first").with_stage("alpha", {
        let mut s = Stage::new("");
        s.output.insert("v1".to_string(), "Alpha".to_string());
        s.selected = "v1".to_string();
        s
    });
    project.create_block("place", "tavern", Some(block)).unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[tavern]"), Some("Zeta first"));
}

#[test]
fn test_brackets_are_optional() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("alice:summary"), Some("Summary"));
}

#[test]
fn test_ambiguous_bare_name_is_unresolved() {
    let mut project = Project::new("Test", "");
    project
        .create_block("character", "alice", Some(block_with_output("raw", "Character Alice")))
        .unwrap();
    project
        .create_block("npc", "alice", Some(block_with_output("raw", "NPC Alice")))
        .unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[alice]"), None);
    assert_eq!(resolver.resolve("[alice:raw]"), None);
    assert!(resolver.locate_by_name("alice").is_none());
    assert_eq!(resolver.resolve("[character:alice]"), Some("Character Alice"));
    assert_eq!(resolver.resolve("[npc:alice]"), Some("NPC Alice"));
}

#[test]
fn test_category_block_takes_precedence_over_block_stage() {
    let mut project = setup_alice();
    project
        .create_block("character", "summary", Some(block_with_output("raw", "Summary block")))
        .unwrap();
    // `alice:summary` is now both category:block and block:stage.
    project
        .create_block("alice", "summary", Some(block_with_output("raw", "Category wins")))
        .unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[character:alice]"), Some("Raw"));
    assert_eq!(resolver.resolve("[alice:summary]"), Some("Category wins"));
}

#[test]
fn test_pair_falls_back_to_block_stage() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[alice:raw]"), Some("Raw"));
    assert_eq!(resolver.resolve("[alice:missing]"), None);
}

#[test]
fn test_missing_pieces_are_unresolved() {
    let mut project = setup_alice();
    project.create_block("character", "empty", None).unwrap();
    project.create_block("character", "unselected", None).unwrap();
    project
        .add_stage("character", "unselected", "raw", "")
        .unwrap();
    project
        .add_version("character", "unselected", "raw", "v1", "never chosen")
        .unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[nonexistent]"), None);
    assert_eq!(resolver.resolve("[character:nobody]"), None);
    assert_eq!(resolver.resolve("[character:alice:missing]"), None);
    assert_eq!(resolver.resolve("[nowhere:alice:raw]"), None);
    assert_eq!(resolver.resolve("[empty]"), None);
    assert_eq!(resolver.resolve("[unselected]"), None);
    assert_eq!(resolver.resolve("[a:b:c:d]"), None);
    assert_eq!(resolver.resolve(""), None);
}

#[test]
fn test_dangling_selection_is_unresolved() {
    let mut block = block_with_output("raw", "content");
    block.stages["raw"].selected = "v9".to_string();
    let mut project = Project::new("Test", "");
    project.create_block("character", "ghost", Some(block)).unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.resolve("[ghost]"), None);
    assert_eq!(resolver.resolve("[character:ghost:raw]"), None);
}

#[test]
fn test_expand_replaces_resolved_tokens() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);

    assert_eq!(
        resolver.expand("Meet [alice]. In short: [alice:summary]!"),
        "Meet Raw. In short: Summary!"
    );
}

#[test]
fn test_expand_leaves_unresolved_tokens_verbatim() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);

    assert_eq!(
        resolver.expand("Use [nonexistent] here"),
        "Use [nonexistent] here"
    );
    assert_eq!(
        resolver.expand("[alice] and [bad-token] and [a:b:c:d]"),
        "Raw and [bad-token] and [a:b:c:d]"
    );
}

#[test]
fn test_expand_without_references_is_identity() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);
    let text = "Plain text with [brackets that] are not references.";
    assert_eq!(resolver.expand(text), text);
    assert_eq!(resolver.expand(&resolver.expand(text)), text);
}

#[test]
fn test_expand_is_one_level_only() {
    let mut project = Project::new("Test", "");
    project
        .create_block("character", "alice", Some(block_with_output("raw", "Alice knows [bob]")))
        .unwrap();
    project
        .create_block("character", "bob", Some(block_with_output("raw", "Bob")))
        .unwrap();

    let resolver = ReferenceResolver::new(&project);
    let once = resolver.expand("Story: [alice]");
    assert_eq!(once, "Story: Alice knows [bob]");
    assert_eq!(resolver.expand(&once), "Story: Alice knows Bob");
}

#[test]
fn test_self_reference_does_not_loop() {
    let mut project = Project::new("Test", "");
    project
        .create_block("character", "loop", Some(block_with_output("raw", "again [loop]")))
        .unwrap();

    let resolver = ReferenceResolver::new(&project);
    assert_eq!(resolver.expand("[loop]"), "again [loop]");
}

#[test]
fn test_resolve_all_summary() {
    let project = setup_alice();
    let resolver = ReferenceResolver::new(&project);

    let result = resolver.resolve_all(&["alice", "alice:summary", "nobody"]);
    assert_eq!(result.total, 3);
    assert_eq!(result.resolved_count, 2);
    assert_eq!(result.unresolved, vec!["nobody".to_string()]);
    assert_eq!(result.resolved[1].content, "Summary");
}

#[test]
fn test_output_selectors() {
    let project = setup_alice();
    let block = project.get_block("character", "alice").unwrap();

    assert_eq!(ReferenceResolver::default_output(block), Some("Raw"));
    assert_eq!(
        ReferenceResolver::stage_output(block, "summary"),
        Some("Summary")
    );
    assert_eq!(ReferenceResolver::stage_output(block, "nope"), None);
    assert_eq!(ReferenceResolver::default_output(&Block::new()), None);
}

#[test]
fn test_project_delegations() {
    let project = setup_alice();
    assert_eq!(
        project.resolve_reference("[alice]"),
        Some("Raw".to_string())
    );
    assert_eq!(project.expand_references("x [alice:summary] y"), "x Summary y");
}

proptest! {
    #[test]
    fn resolve_and_expand_never_panic(text in any::<String>()) {
        let project = setup_alice();
        let resolver = ReferenceResolver::new(&project);
        let _ = resolver.resolve(&text);
        let _ = resolver.expand(&text);
    }

    #[test]
    fn expand_without_resolvable_tokens_is_identity(
        text in r"[\[\]:a-z_ é]{0,60}",
    ) {
        let project = setup_alice();
        let resolver = ReferenceResolver::new(&project);
        let nothing_resolves = find_references(&text).all(|m| resolver.resolve(m.token).is_none());
        if nothing_resolves {
            prop_assert_eq!(resolver.expand(&text), text.clone());
        }

        let empty = Project::new("Empty", "");
        prop_assert_eq!(ReferenceResolver::new(&empty).expand(&text), text);
    }
}
