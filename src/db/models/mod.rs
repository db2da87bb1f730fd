//! This module contains all the sqlx structs for the database tables.

/// sqlx structs for collector table.
pub mod collector;
/// sqlx structs for scm_commit table.
pub mod commit;
/// sqlx structs for component and component_collector_item tables.
pub mod component;
/// sqlx structs for subversion_repo table.
pub mod subversion_repo;

/// Converts an integer flag column into a `bool`.
///
/// Flags are stored as integers so that `SQLite` and Postgres decode them the same way through the
/// `Any` driver.
pub(crate) const fn flag(value: i64) -> bool {
    value != 0
}

/// Converts a `bool` into the integer stored in flag columns.
pub(crate) const fn flag_value(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
