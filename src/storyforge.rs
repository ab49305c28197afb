use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{
    get_storyforge_dir, load_config, project_path, save_config, StoryForgeConfig,
};
use crate::document::Project;
use crate::errors::{Result, StoryForgeError};
use crate::graph::{BlockMetrics, ReferenceQueryManager};
use crate::resolution::{find_references, ReferenceResolver};
use crate::types::*;

/// Central orchestrator tying a project file to its workspace configuration.
pub struct StoryForge {
    project: Project,
    config: StoryForgeConfig,
    project_root: PathBuf,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl StoryForge {
    /// Initializes a new workspace at `project_root`.
    ///
    /// Writes a default configuration and an empty project file. Fails if the
    /// workspace is already initialized or a project file is already present.
    pub fn init(project_root: &Path, title: &str, author: &str) -> Result<Self> {
        if Self::is_initialized(project_root) {
            return Err(StoryForgeError::Config {
                message: format!(
                    "a StoryForge workspace already exists at '{}'",
                    project_root.display()
                ),
            });
        }

        let config = StoryForgeConfig::default();
        let path = project_path(project_root, &config);
        if path.exists() {
            return Err(StoryForgeError::Config {
                message: format!("a project file already exists at '{}'", path.display()),
            });
        }
        save_config(project_root, &config)?;

        let mut project = Project::new(title, author);
        project.save(Some(&path))?;

        info!(root = %project_root.display(), "initialized workspace");
        Ok(Self {
            project,
            config,
            project_root: project_root.to_path_buf(),
        })
    }

    /// Opens an existing workspace, loading its configuration and project.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        let path = project_path(project_root, &config);

        if !path.exists() {
            return Err(StoryForgeError::Config {
                message: format!(
                    "no project found at '{}'; run 'storyforge init' first",
                    path.display()
                ),
            });
        }

        let project = Project::load(&path)?;
        Ok(Self {
            project,
            config,
            project_root: project_root.to_path_buf(),
        })
    }

    /// Returns `true` if a workspace has been initialized at the given root.
    pub fn is_initialized(project_root: &Path) -> bool {
        get_storyforge_dir(project_root).exists()
    }

    /// Writes the project back to its file.
    pub fn save(&mut self) -> Result<()> {
        let path = project_path(&self.project_root, &self.config);
        self.project.save(Some(&path))
    }
}

// ---------------------------------------------------------------------------
// Query delegation
// ---------------------------------------------------------------------------

impl StoryForge {
    /// Resolves a reference token to the text it names.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        self.project.resolve_reference(reference)
    }

    /// Expands every resolvable reference in `text`, one level deep.
    pub fn expand(&self, text: &str) -> String {
        self.project.expand_references(text)
    }

    /// Expands the references in a stage's input text.
    pub fn expand_stage_input(&self, category: &str, block: &str, stage: &str) -> Result<String> {
        let stage_data = self
            .project
            .get_stage(category, block, stage)
            .ok_or_else(|| StoryForgeError::StageNotFound {
                category: category.to_string(),
                block: block.to_string(),
                stage: stage.to_string(),
            })?;
        Ok(self.expand(&stage_data.input))
    }

    /// Tokens cited by a block's stage inputs.
    pub fn references_in(&self, category: &str, block: &str) -> BTreeSet<String> {
        self.project.find_references_in(category, block)
    }

    /// Stages citing a block.
    pub fn references_to(&self, category: &str, block: &str) -> Vec<BlockRef> {
        self.project.find_references_to(category, block)
    }

    /// Tokens cited by a block that do not resolve.
    pub fn unresolved_references_in(&self, category: &str, block: &str) -> BTreeSet<String> {
        let resolver = ReferenceResolver::new(&self.project);
        ReferenceQueryManager::new(&self.project).unresolved_references(&resolver, category, block)
    }

    /// Blocks no other block cites.
    pub fn unreferenced_blocks(&self) -> Vec<(String, String)> {
        ReferenceQueryManager::new(&self.project).find_unreferenced_blocks()
    }

    /// Reference metrics for a single block.
    pub fn block_metrics(&self, category: &str, block: &str) -> BlockMetrics {
        let resolver = ReferenceResolver::new(&self.project);
        ReferenceQueryManager::new(&self.project).get_block_metrics(&resolver, category, block)
    }

    /// Returns aggregate statistics about the project.
    pub fn get_stats(&self) -> ProjectStats {
        let resolver = ReferenceResolver::new(&self.project);
        let mut stats = ProjectStats {
            category_count: self.project.list_categories().len(),
            ..ProjectStats::default()
        };

        for (_, _, block) in self.project.all_blocks() {
            stats.block_count += 1;
            for stage in block.stages.values() {
                stats.stage_count += 1;
                stats.version_count += stage.output.len();
                for m in find_references(&stage.input) {
                    stats.reference_count += 1;
                    if resolver.resolve(m.token).is_none() {
                        stats.unresolved_count += 1;
                    }
                }
            }
        }

        stats
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Returns a reference to the current configuration.
    pub fn get_config(&self) -> &StoryForgeConfig {
        &self.config
    }

    /// Returns the workspace root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}
