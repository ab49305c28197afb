use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Application version stamped into every project file.
pub const STORYFORGE_VERSION: &str = "1.0";

/// Schema version of the persisted project state.
pub const SCHEMA_VERSION: u32 = 1;

/// A named phase of content production within a block (e.g. "raw",
/// "summary"): free-text input plus candidate output versions, at most one
/// of which is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub input: String,
    /// Key of the active version; empty when nothing is selected.
    #[serde(default)]
    pub selected: String,
    #[serde(default)]
    pub output: IndexMap<String, String>,
}

impl Stage {
    /// Creates a stage with the given input, no versions and no selection.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            selected: String::new(),
            output: IndexMap::new(),
        }
    }

    /// Returns the content of the selected version.
    ///
    /// `None` when nothing is selected or the selection names a version that
    /// no longer exists.
    pub fn selected_output(&self) -> Option<&str> {
        if self.selected.is_empty() {
            return None;
        }
        self.output.get(&self.selected).map(String::as_str)
    }
}

/// A named unit of content within a category, holding stages in the order
/// they were added. The first stage is the block's default output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub stages: IndexMap<String, Stage>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper appending a stage.
    pub fn with_stage(mut self, name: impl Into<String>, stage: Stage) -> Self {
        self.stages.insert(name.into(), stage);
        self
    }

    /// The first stage in insertion order.
    pub fn first_stage(&self) -> Option<(&str, &Stage)> {
        self.stages
            .first()
            .map(|(name, stage)| (name.as_str(), stage))
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Blocks of one category keyed by name.
pub type Category = IndexMap<String, Block>;

/// Title and author of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

/// Per-project settings carried alongside the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub llm_provider: String,
    #[serde(default = "default_reference_mode")]
    pub default_reference_mode: String,
}

fn default_reference_mode() -> String {
    "summary".to_string()
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            llm_provider: String::new(),
            default_reference_mode: default_reference_mode(),
        }
    }
}

/// Editor tree state persisted with the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    #[serde(default)]
    pub expanded_categories: Vec<String>,
    #[serde(default)]
    pub selected: String,
}

/// The complete persisted state of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub storyforge: String,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub project: ProjectMetadata,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub blocks: IndexMap<String, Category>,
    #[serde(default)]
    pub tree: TreeState,
}

impl ProjectState {
    /// Creates an empty state with the current version stamps.
    pub fn empty(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            storyforge: STORYFORGE_VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
            project: ProjectMetadata {
                title: title.into(),
                author: author.into(),
            },
            settings: ProjectSettings::default(),
            blocks: IndexMap::new(),
            tree: TreeState::default(),
        }
    }
}

/// A stage whose input text cites some target block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockRef {
    pub category: String,
    pub block: String,
    pub stage: String,
}

impl BlockRef {
    pub fn new(
        category: impl Into<String>,
        block: impl Into<String>,
        stage: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            block: block.into(),
            stage: stage.into(),
        }
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.category, self.block, self.stage)
    }
}

/// Aggregate counts describing a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub category_count: usize,
    pub block_count: usize,
    pub stage_count: usize,
    pub version_count: usize,
    /// Reference tokens across all stage inputs, duplicates included.
    pub reference_count: usize,
    /// Those of `reference_count` that do not currently resolve.
    pub unresolved_count: usize,
}

/// A reference token together with the text it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub token: String,
    pub content: String,
}

/// Result of resolving a batch of reference tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub resolved: Vec<ResolvedReference>,
    pub unresolved: Vec<String>,
    pub total: usize,
    pub resolved_count: usize,
}
