//! Audio file discovery

pub mod scanner;

pub use scanner::{generate_project_id, scan, DiscoveredFile};
