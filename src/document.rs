//! The StoryForge project: a tree of categories, blocks, stages and versions.
//!
//! `Project` owns the document state and provides the typed CRUD surface the
//! reference engine reads from (`get_block`, `all_blocks`,
//! `get_selected_output`). Names and content enter as owned strings through
//! `impl Into<String>` parameters.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{Result, StoryForgeError};
use crate::graph::ReferenceQueryManager;
use crate::resolution::ReferenceResolver;
use crate::types::*;

/// A StoryForge project and the path it was loaded from or last saved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    path: Option<PathBuf>,
    state: ProjectState,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl Project {
    /// Creates an empty, unsaved project.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            path: None,
            state: ProjectState::empty(title, author),
        }
    }

    /// Loads a project file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StoryForgeError::File {
                message: "project file not found".to_string(),
                path: path.display().to_string(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|e| StoryForgeError::File {
            message: format!("failed to read project file: {e}"),
            path: path.display().to_string(),
        })?;

        if contents.trim().is_empty() {
            return Err(StoryForgeError::Parse {
                message: "empty project file".to_string(),
                path: path.display().to_string(),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| StoryForgeError::Parse {
                message: format!("invalid project file: {e}"),
                path: path.display().to_string(),
            })?;

        if value.get("storyforge").is_none() {
            return Err(StoryForgeError::Parse {
                message: "not a StoryForge project file".to_string(),
                path: path.display().to_string(),
            });
        }

        let state: ProjectState =
            serde_json::from_value(value).map_err(|e| StoryForgeError::Parse {
                message: format!("invalid project structure: {e}"),
                path: path.display().to_string(),
            })?;

        info!(path = %path.display(), "loaded project");
        Ok(Self {
            path: Some(path.to_path_buf()),
            state,
        })
    }

    /// Saves the project, to `path` if given or else to the remembered path.
    ///
    /// Parent directories are created as needed and the file is replaced
    /// atomically. The path written becomes the remembered path.
    pub fn save(&mut self, path: Option<&Path>) -> Result<()> {
        let save_path = match path.or(self.path.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(StoryForgeError::Project {
                    message: "no path specified for saving".to_string(),
                })
            }
        };

        if let Some(parent) = save_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoryForgeError::File {
                    message: format!("failed to create project directory: {e}"),
                    path: parent.display().to_string(),
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp_path = save_path.with_extension("tmp");
        fs::write(&tmp_path, json).map_err(|e| StoryForgeError::File {
            message: format!("failed to write project file: {e}"),
            path: tmp_path.display().to_string(),
        })?;
        fs::rename(&tmp_path, &save_path).map_err(|e| StoryForgeError::File {
            message: format!("failed to replace project file: {e}"),
            path: save_path.display().to_string(),
        })?;

        info!(path = %save_path.display(), "saved project");
        self.path = Some(save_path);
        Ok(())
    }

    /// Path the project was loaded from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read-only access to the full state, for serialization.
    pub fn state(&self) -> &ProjectState {
        &self.state
    }
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

impl Project {
    pub fn title(&self) -> &str {
        &self.state.project.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.state.project.title = title.into();
    }

    pub fn author(&self) -> &str {
        &self.state.project.author
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.state.project.author = author.into();
    }

    pub fn storyforge_version(&self) -> &str {
        &self.state.storyforge
    }

    pub fn schema_version(&self) -> u32 {
        self.state.schema_version
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.state.settings
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

impl Project {
    pub fn list_categories(&self) -> Vec<String> {
        self.state.blocks.keys().cloned().collect()
    }

    /// Creates an empty category; a no-op if it already exists.
    pub fn create_category(&mut self, category: impl Into<String>) {
        self.state.blocks.entry(category.into()).or_default();
    }

    /// Deletes a category and all of its blocks. Returns `true` if it existed.
    pub fn delete_category(&mut self, category: &str) -> bool {
        self.state.blocks.shift_remove(category).is_some()
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

impl Project {
    pub fn list_blocks(&self, category: &str) -> Vec<String> {
        self.state
            .blocks
            .get(category)
            .map(|blocks| blocks.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_block(&self, category: &str, name: &str) -> Option<&Block> {
        self.state.blocks.get(category)?.get(name)
    }

    pub fn get_block_mut(&mut self, category: &str, name: &str) -> Option<&mut Block> {
        self.state.blocks.get_mut(category)?.get_mut(name)
    }

    /// Every block in project order as `(category, name, block)`.
    pub fn all_blocks(&self) -> impl Iterator<Item = (&str, &str, &Block)> + '_ {
        self.state.blocks.iter().flat_map(|(category, blocks)| {
            blocks
                .iter()
                .map(move |(name, block)| (category.as_str(), name.as_str(), block))
        })
    }

    /// Creates a block, creating its category if needed.
    pub fn create_block(
        &mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        block: Option<Block>,
    ) -> Result<&mut Block> {
        let (category, name) = (category.into(), name.into());
        let blocks = self.state.blocks.entry(category.clone()).or_default();

        if blocks.contains_key(&name) {
            return Err(StoryForgeError::BlockExists {
                category,
                block: name,
            });
        }

        Ok(blocks.entry(name).or_insert(block.unwrap_or_default()))
    }

    /// Replaces the stages of an existing block.
    pub fn update_block(&mut self, category: &str, name: &str, block: Block) -> Result<()> {
        let existing = self
            .get_block_mut(category, name)
            .ok_or_else(|| block_not_found(category, name))?;
        *existing = block;
        Ok(())
    }

    /// Deletes a block. Returns `true` if it existed.
    pub fn delete_block(&mut self, category: &str, name: &str) -> bool {
        self.state
            .blocks
            .get_mut(category)
            .and_then(|blocks| blocks.shift_remove(name))
            .is_some()
    }

    /// Renames a block within its category. The renamed block moves to the
    /// end of the category.
    pub fn rename_block(&mut self, category: &str, old_name: &str, new_name: &str) -> Result<()> {
        if self.get_block(category, old_name).is_none() {
            return Err(block_not_found(category, old_name));
        }
        if self.get_block(category, new_name).is_some() {
            return Err(StoryForgeError::BlockExists {
                category: category.to_string(),
                block: new_name.to_string(),
            });
        }

        let blocks = self
            .state
            .blocks
            .get_mut(category)
            .ok_or_else(|| block_not_found(category, old_name))?;
        let block = blocks
            .shift_remove(old_name)
            .ok_or_else(|| block_not_found(category, old_name))?;
        blocks.insert(new_name.to_string(), block);
        Ok(())
    }

    /// Moves a block into another category, creating it if needed.
    pub fn move_block(&mut self, old_category: &str, name: &str, new_category: &str) -> Result<()> {
        if self.get_block(old_category, name).is_none() {
            return Err(block_not_found(old_category, name));
        }
        if self.get_block(new_category, name).is_some() {
            return Err(StoryForgeError::BlockExists {
                category: new_category.to_string(),
                block: name.to_string(),
            });
        }

        let block = self
            .state
            .blocks
            .get_mut(old_category)
            .and_then(|blocks| blocks.shift_remove(name))
            .ok_or_else(|| block_not_found(old_category, name))?;
        self.state
            .blocks
            .entry(new_category.to_string())
            .or_default()
            .insert(name.to_string(), block);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

impl Project {
    pub fn get_stage(&self, category: &str, block: &str, stage: &str) -> Option<&Stage> {
        self.get_block(category, block)?.stage(stage)
    }

    fn get_stage_mut(&mut self, category: &str, block: &str, stage: &str) -> Result<&mut Stage> {
        self.get_block_mut(category, block)
            .and_then(|b| b.stages.get_mut(stage))
            .ok_or_else(|| stage_not_found(category, block, stage))
    }

    /// Adds a stage to a block. Re-adding an existing stage name replaces it
    /// in place, keeping its position.
    pub fn add_stage(
        &mut self,
        category: &str,
        block: &str,
        stage: impl Into<String>,
        input: impl Into<String>,
    ) -> Result<&mut Stage> {
        let block_data = self
            .get_block_mut(category, block)
            .ok_or_else(|| block_not_found(category, block))?;

        let stage = stage.into();
        block_data.stages.insert(stage.clone(), Stage::new(input));
        block_data
            .stages
            .get_mut(&stage)
            .ok_or_else(|| stage_not_found(category, block, &stage))
    }

    pub fn update_stage_input(
        &mut self,
        category: &str,
        block: &str,
        stage: &str,
        input: impl Into<String>,
    ) -> Result<()> {
        self.get_stage_mut(category, block, stage)?.input = input.into();
        Ok(())
    }

    /// Deletes a stage. Remaining stages keep their order.
    pub fn delete_stage(&mut self, category: &str, block: &str, stage: &str) -> bool {
        self.get_block_mut(category, block)
            .and_then(|b| b.stages.shift_remove(stage))
            .is_some()
    }

    /// Stage names in insertion order.
    pub fn list_stages(&self, category: &str, block: &str) -> Vec<String> {
        self.get_block(category, block)
            .map(|b| b.stages.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

impl Project {
    pub fn add_version(
        &mut self,
        category: &str,
        block: &str,
        stage: &str,
        version: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        self.get_stage_mut(category, block, stage)?
            .output
            .insert(version.into(), content.into());
        Ok(())
    }

    pub fn get_version(
        &self,
        category: &str,
        block: &str,
        stage: &str,
        version: &str,
    ) -> Option<&str> {
        self.get_stage(category, block, stage)?
            .output
            .get(version)
            .map(String::as_str)
    }

    /// Makes `version` the active output of the stage.
    pub fn select_version(
        &mut self,
        category: &str,
        block: &str,
        stage: &str,
        version: &str,
    ) -> Result<()> {
        let stage_data = self.get_stage_mut(category, block, stage)?;
        if !stage_data.output.contains_key(version) {
            return Err(StoryForgeError::VersionNotFound {
                category: category.to_string(),
                block: block.to_string(),
                stage: stage.to_string(),
                version: version.to_string(),
            });
        }
        stage_data.selected = version.to_string();
        Ok(())
    }

    /// Deletes a version, clearing the selection if it was selected.
    pub fn delete_version(
        &mut self,
        category: &str,
        block: &str,
        stage: &str,
        version: &str,
    ) -> bool {
        let Ok(stage_data) = self.get_stage_mut(category, block, stage) else {
            return false;
        };
        if stage_data.output.shift_remove(version).is_none() {
            return false;
        }
        if stage_data.selected == version {
            stage_data.selected.clear();
        }
        true
    }

    /// Content of the selected version, or `None` if nothing is selected.
    pub fn get_selected_output(&self, category: &str, block: &str, stage: &str) -> Option<&str> {
        self.get_stage(category, block, stage)?.selected_output()
    }

    pub fn list_versions(&self, category: &str, block: &str, stage: &str) -> Vec<String> {
        self.get_stage(category, block, stage)
            .map(|s| s.output.keys().cloned().collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

impl Project {
    /// See [`ReferenceResolver::resolve`].
    pub fn resolve_reference(&self, reference: &str) -> Option<String> {
        ReferenceResolver::new(self)
            .resolve(reference)
            .map(str::to_string)
    }

    /// See [`ReferenceResolver::expand`].
    pub fn expand_references(&self, text: &str) -> String {
        ReferenceResolver::new(self).expand(text)
    }

    /// See [`ReferenceQueryManager::outward_references`].
    pub fn find_references_in(&self, category: &str, block: &str) -> BTreeSet<String> {
        ReferenceQueryManager::new(self).outward_references(category, block)
    }

    /// See [`ReferenceQueryManager::inward_references`].
    pub fn find_references_to(&self, category: &str, block: &str) -> Vec<BlockRef> {
        ReferenceQueryManager::new(self).inward_references(category, block)
    }
}

fn block_not_found(category: &str, block: &str) -> StoryForgeError {
    StoryForgeError::BlockNotFound {
        category: category.to_string(),
        block: block.to_string(),
    }
}

fn stage_not_found(category: &str, block: &str, stage: &str) -> StoryForgeError {
    StoryForgeError::StageNotFound {
        category: category.to_string(),
        block: block.to_string(),
        stage: stage.to_string(),
    }
}
