//! Per-field boundary condition files under `0/`.

pub mod pressure;
pub mod temperature;

pub use pressure::PressureBuilder;
pub use temperature::TemperatureBuilder;
