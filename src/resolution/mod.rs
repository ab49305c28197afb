/// Reference resolution module.
///
/// Finds bracketed reference tokens in free text, resolves them to the
/// selected output of the block and stage they name, and expands them in
/// place.
pub mod pattern;
pub mod reference;
mod resolver;

pub use pattern::{contains_reference, find_references, ReferenceMatch, ReferenceMatches};
pub use reference::Reference;
pub use resolver::ReferenceResolver;
