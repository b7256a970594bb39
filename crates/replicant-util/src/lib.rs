//! replicant-util — leaf utilities for working with JSON document values.
//!
//! Small helpers shared across the replicant workspace: deep clone and deep
//! equality over `serde_json::Value`, a stable insertion sort for small key
//! slices, and JSON string escaping for the canonical encoder.

pub mod clone;
pub mod equal;
pub mod sort;
pub mod strings;

pub use clone::deep_clone;
pub use equal::deep_equal;
pub use sort::insertion_sort_by;
pub use strings::escape;
