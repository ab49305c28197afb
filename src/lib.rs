pub mod config;
pub mod document;
pub mod errors;
pub mod graph;
pub mod mcp;
pub mod resolution;
pub mod storyforge;
pub mod types;
