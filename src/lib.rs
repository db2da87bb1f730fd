//! # svn-collector
//!
//! A dashboard collector that polls Subversion repositories for new commits
//! and records them in the dashboard datastore.
//!
//! Each polling cycle disables repositories that no dashboard component
//! references any more, fetches the commits of every enabled repository
//! from its latest known revision onward, stores the ones not seen before
//! and advances that repository's revision watermark.

// =========================================================================
//                  Canonical lints for whole crate
// =========================================================================
// Lint groups are warnings during development; CI turns them into errors.
#![warn(
    clippy::all,
    missing_docs,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(
    clippy::blanket_clippy_restriction_lints,
    reason = "Restriction lints are opted into wholesale and then pared back below."
)]
#![warn(clippy::restriction)]
//
// =========================================================================
//   Individually blanket-allow single lints relevant to this whole crate
// =========================================================================
#![allow(clippy::implicit_return, reason = "This is idiomatic Rust")]
#![allow(
    clippy::multiple_crate_versions,
    reason = "sqlx and tracing-subscriber pull in overlapping transitive versions"
)]
#![allow(
    clippy::std_instead_of_alloc,
    reason = "We're not interested in becoming no-std compatible"
)]
#![allow(
    clippy::std_instead_of_core,
    reason = "Import items from std instead of core"
)]
#![allow(
    clippy::mod_module_files,
    reason = "Model directories keep their trait in mod.rs next to manager.rs"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Nothing here is hot enough to benefit from explicit inline hints"
)]
#![allow(
    clippy::exhaustive_structs,
    reason = "Records are plain data shared between the store and the collector task"
)]
#![allow(
    clippy::exhaustive_enums,
    reason = "Records are plain data shared between the store and the collector task"
)]
#![allow(
    clippy::question_mark_used,
    reason = "We rely on propagating errors with question mark extensively"
)]
#![allow(
    clippy::single_call_fn,
    reason = "We tend to break up long functions into smaller ones, so this lint is not useful"
)]
#![allow(
    clippy::arithmetic_side_effects,
    reason = "Arithmetic is limited to counters and revision comparisons"
)]
#![allow(
    clippy::arbitrary_source_item_ordering,
    reason = "Items are ordered by reading flow rather than by kind"
)]

pub mod collector;
pub mod db;
pub mod scm;
pub mod utils;
