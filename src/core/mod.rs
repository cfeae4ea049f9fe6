// Core modules: error model, configuration, spider catalog, and parameter builders.
pub mod config;
pub mod error;
pub mod params;
pub mod spider;
