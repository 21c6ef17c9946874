//! JSON configuration for the demo runner and embedding services.

pub mod demo;

pub use demo::{load_config, DemoConfig, EngineConfig, OutputConfig, OutputFormat};
