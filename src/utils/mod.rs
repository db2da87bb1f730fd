//! Helpers shared by the command line front-end and the collector.
pub mod cli;
pub mod ids;
pub mod workspace;
