//! Purpose: Library crate behind the `benchsort` CLI and its tests.
//! Exports: `core` (row model, comparable codec, generator, data store, errors).
//! Role: Produce and reload fixed-shape row data for external sort benchmarks.
//! Invariants: Core modules take explicit configuration; no process-wide state.
pub mod core;
