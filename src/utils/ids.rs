//! Deterministic identifiers derived with `md5`.
//!
//! Ids are content-derived so that registering the same collector, repository or component twice
//! refers to the same record.
use md5::{Digest, Md5};

/// Compute the `md5` hash of the concatenated `parts`.
///
/// The result is a hexadecimal string of 32 characters.
#[must_use]
pub fn compute(parts: &[&str]) -> String {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    format!("{result:x}")
}

/// Id of the collector registered under `name`.
#[must_use]
pub fn collector_id(name: &str) -> String {
    compute(&["collector:", name])
}

/// Id of the repository at `url` tracked by the collector `collector_id`.
#[must_use]
pub fn repository_id(collector_id: &str, url: &str) -> String {
    compute(&[collector_id, url.trim_end_matches('/')])
}

/// Id of the dashboard component named `name`.
#[must_use]
pub fn component_id(name: &str) -> String {
    compute(&["component:", name])
}
