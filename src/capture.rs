pub(crate) mod driver;
pub(crate) mod encode;
pub(crate) mod metadata;
pub(crate) mod orchestrator;
