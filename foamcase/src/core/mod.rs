//! Deterministic, pure logic for case generation.
//!
//! Core modules are free of filesystem side effects. Builders receive their
//! configuration through [`config_db::ConfigDb`] and hand auxiliary exports
//! to an [`builder::AuxSink`], so everything here runs against in-memory
//! fixtures in tests.

pub mod boundary_rules;
pub mod builder;
pub mod config_db;
pub mod dictionary;
pub mod error;
pub mod fields;
pub mod fv_solution;
pub mod render;
pub mod time_dirs;
pub mod types;
