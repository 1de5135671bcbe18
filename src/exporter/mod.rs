// file: src/exporter/mod.rs
// description: result export module exports

pub mod json;

pub use json::{ExportEnvelope, JsonExporter};
