use std::collections::HashMap;

use tracing::{debug, trace};

use crate::document::Project;
use crate::types::*;

use super::pattern::{contains_reference, find_references};
use super::reference::Reference;

/// Resolves reference tokens against a project and expands them in text.
///
/// A name index (block name -> categories holding it) is built once at
/// construction. The resolver borrows the project immutably, so the index
/// can never go stale while the resolver is alive.
pub struct ReferenceResolver<'a> {
    project: &'a Project,
    /// Categories containing a block of the given name, in project order.
    name_index: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> ReferenceResolver<'a> {
    /// Creates a resolver over the current state of `project`.
    pub fn new(project: &'a Project) -> Self {
        let mut name_index: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        for (category, name, _) in project.all_blocks() {
            name_index.entry(name).or_default().push(category);
        }

        Self {
            project,
            name_index,
        }
    }

    /// Resolves a single token (brackets optional) to the selected output it
    /// names.
    ///
    /// Never fails: malformed tokens, missing blocks or stages, empty or
    /// dangling selections and ambiguous bare names all yield `None`.
    pub fn resolve(&self, token: &str) -> Option<&'a str> {
        let Some(reference) = Reference::parse(token) else {
            trace!(token, "reference has too many segments");
            return None;
        };

        let resolved = match reference {
            Reference::Bare(name) => {
                let (_, block) = self.locate_by_name(name)?;
                Self::default_output(block)
            }
            Reference::Pair(first, second) => {
                // `category:block` wins over `block:stage`.
                if let Some(block) = self.locate_by_category(first, second) {
                    Self::default_output(block)
                } else {
                    let (_, block) = self.locate_by_name(first)?;
                    Self::stage_output(block, second)
                }
            }
            Reference::Full {
                category,
                block,
                stage,
            } => {
                let block = self.locate_by_category(category, block)?;
                Self::stage_output(block, stage)
            }
        };

        if resolved.is_none() {
            trace!(token, "reference did not resolve");
        }
        resolved
    }

    /// Resolves a batch of tokens, returning a summary of the results.
    pub fn resolve_all<S: AsRef<str>>(&self, tokens: &[S]) -> ResolutionResult {
        let total = tokens.len();
        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            match self.resolve(token) {
                Some(content) => resolved.push(ResolvedReference {
                    token: token.to_string(),
                    content: content.to_string(),
                }),
                None => unresolved.push(token.to_string()),
            }
        }

        let resolved_count = resolved.len();

        ResolutionResult {
            resolved,
            unresolved,
            total,
            resolved_count,
        }
    }

    /// Replaces every resolvable token in `text` with its content.
    ///
    /// Unresolved tokens are kept verbatim. Substituted content is not
    /// scanned again, so expansion is exactly one level deep.
    pub fn expand(&self, text: &str) -> String {
        if !contains_reference(text) {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for m in find_references(text) {
            out.push_str(&text[last..m.start]);
            match self.resolve(m.token) {
                Some(content) => out.push_str(content),
                None => out.push_str(m.as_str()),
            }
            last = m.end;
        }

        out.push_str(&text[last..]);
        out
    }

    /// Finds the single block called `name` across all categories.
    ///
    /// Returns `None` when no category or more than one category holds such
    /// a block; an ambiguous name is never resolved to an arbitrary pick.
    pub fn locate_by_name(&self, name: &str) -> Option<(&'a str, &'a Block)> {
        let categories = self.name_index.get(name)?;
        match categories.as_slice() {
            [category] => self
                .locate_by_category(category, name)
                .map(|block| (*category, block)),
            many => {
                debug!(
                    name,
                    categories = many.len(),
                    "bare block name is ambiguous"
                );
                None
            }
        }
    }

    /// Direct lookup of a block within a category.
    pub fn locate_by_category(&self, category: &str, name: &str) -> Option<&'a Block> {
        self.project.get_block(category, name)
    }

    /// Selected output of the block's first stage in insertion order.
    pub fn default_output(block: &'a Block) -> Option<&'a str> {
        let (_, stage) = block.first_stage()?;
        stage.selected_output()
    }

    /// Selected output of the named stage.
    pub fn stage_output(block: &'a Block, stage: &str) -> Option<&'a str> {
        block.stage(stage)?.selected_output()
    }
}
