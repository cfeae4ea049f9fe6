//! Purpose: Library crate behind the `igscrape` CLI and its tests.
//! Exports: `core` (errors, config, spiders, params), `json` (tolerant decoder),
//! `api` (task runner, transport, scraper boundary), `output` (file persistence).
//! Role: Keeps the binary thin; every decision lives here where it can be tested.
//! Invariants: Modules take explicit inputs; no process-wide mutable state.
pub mod api;
pub mod core;
pub mod json;
pub mod output;
