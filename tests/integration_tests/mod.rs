// Aggregates the end-to-end suites; each drives resources through their handlers.
pub mod support;

mod controller;
mod envelope;
mod resources;
mod service;
