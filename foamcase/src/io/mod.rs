//! Filesystem side of case generation.

pub mod case_fs;
pub mod case_paths;
pub mod config_store;
pub mod settings;
pub mod writer;
