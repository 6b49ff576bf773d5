//! Host boundary: the scene primitives and bake primitive the pipeline drives, plus an in-memory
//! reference host.

pub(crate) mod bake;
pub(crate) mod memory;
pub(crate) mod scene;
