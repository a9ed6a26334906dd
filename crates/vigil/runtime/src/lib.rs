//! Runtime assembly for the vigil approval core
//!
//! Wires the store, gate engine, transition controller and dispatcher
//! behind one signal-driven entry point, and owns the ambient concerns:
//! configuration loading and tracing setup.

#![deny(unsafe_code)]

mod error;
mod processor;
mod settings;
mod telemetry;

pub use error::VigilError;
pub use processor::Processor;
pub use settings::load_config;
pub use telemetry::init_telemetry;
