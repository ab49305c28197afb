/// Reference index queries: outward and inward references between blocks.
pub mod queries;

pub use queries::{BlockMetrics, ReferenceQueryManager};
