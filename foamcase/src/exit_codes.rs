//! Stable exit codes for foamcase CLI commands.

/// Command succeeded (or `check-mesh` found a valid mesh).
pub const OK: i32 = 0;
/// Invalid arguments, settings, configuration or a filesystem failure.
pub const INVALID: i32 = 1;
/// The configuration cannot be compiled yet (e.g. no solver can be chosen).
pub const NOT_READY: i32 = 2;
/// A mesh directory is missing one of the polyMesh files.
pub const NOT_A_MESH: i32 = 3;
