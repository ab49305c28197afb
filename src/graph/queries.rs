use std::collections::BTreeSet;

use tracing::debug;

use crate::document::Project;
use crate::resolution::{find_references, Reference, ReferenceResolver};
use crate::types::*;

/// Counts describing how a single block is wired into the reference graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMetrics {
    /// Number of stages in the block.
    pub stage_count: usize,
    /// Distinct tokens cited by the block's stage inputs.
    pub outgoing_reference_count: usize,
    /// Of those, tokens that currently resolve to nothing.
    pub unresolved_reference_count: usize,
    /// Stages anywhere in the project citing this block.
    pub incoming_reference_count: usize,
}

/// Answers "what does this block cite" and "who cites this block" by scanning
/// stage inputs. Nothing is cached: every query reads the current project.
pub struct ReferenceQueryManager<'a> {
    project: &'a Project,
}

impl<'a> ReferenceQueryManager<'a> {
    /// Creates a query manager over the given project.
    pub fn new(project: &'a Project) -> Self {
        Self { project }
    }

    /// Distinct reference tokens (without brackets) used in any stage input
    /// of the block. Empty when the block does not exist.
    pub fn outward_references(&self, category: &str, block: &str) -> BTreeSet<String> {
        let Some(block_data) = self.project.get_block(category, block) else {
            return BTreeSet::new();
        };

        block_data
            .stages
            .values()
            .flat_map(|stage| find_references(&stage.input))
            .map(|m| m.token.to_string())
            .collect()
    }

    /// Every stage in the project whose input cites the target block.
    ///
    /// Each stage appears at most once no matter how many of its tokens
    /// match. Results follow project order (categories, blocks, stages).
    pub fn inward_references(&self, target_category: &str, target_block: &str) -> Vec<BlockRef> {
        let mut results = Vec::new();

        for (category, name, block) in self.project.all_blocks() {
            for (stage_name, stage) in &block.stages {
                let cites_target = find_references(&stage.input).any(|m| {
                    Reference::parse(m.token)
                        .is_some_and(|r| r.matches_target(target_category, target_block))
                });
                if cites_target {
                    results.push(BlockRef::new(category, name, stage_name.as_str()));
                }
            }
        }

        debug!(
            category = target_category,
            block = target_block,
            count = results.len(),
            "collected inward references"
        );
        results
    }

    /// Tokens cited by the block that the resolver cannot resolve.
    pub fn unresolved_references(
        &self,
        resolver: &ReferenceResolver<'_>,
        category: &str,
        block: &str,
    ) -> BTreeSet<String> {
        self.outward_references(category, block)
            .into_iter()
            .filter(|token| resolver.resolve(token).is_none())
            .collect()
    }

    /// Blocks that no stage of any *other* block cites.
    pub fn find_unreferenced_blocks(&self) -> Vec<(String, String)> {
        let mut unreferenced = Vec::new();

        for (category, name, _) in self.project.all_blocks() {
            let cited_elsewhere = self
                .inward_references(category, name)
                .iter()
                .any(|r| !(r.category == category && r.block == name));
            if !cited_elsewhere {
                unreferenced.push((category.to_string(), name.to_string()));
            }
        }

        unreferenced
    }

    /// Computes reference metrics for a single block.
    pub fn get_block_metrics(
        &self,
        resolver: &ReferenceResolver<'_>,
        category: &str,
        block: &str,
    ) -> BlockMetrics {
        let stage_count = self
            .project
            .get_block(category, block)
            .map(|b| b.stages.len())
            .unwrap_or(0);
        let outgoing = self.outward_references(category, block);
        let unresolved_reference_count = outgoing
            .iter()
            .filter(|token| resolver.resolve(token).is_none())
            .count();

        BlockMetrics {
            stage_count,
            outgoing_reference_count: outgoing.len(),
            unresolved_reference_count,
            incoming_reference_count: self.inward_references(category, block).len(),
        }
    }
}
