//! Status engine: apply, stack, tick, cleanse, dispel and lifecycle hooks.

mod engine;

pub use engine::StatusEngine;
