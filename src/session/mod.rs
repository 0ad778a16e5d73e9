pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod engine;
pub(crate) mod scheduler;
pub(crate) mod sequencer;
pub(crate) mod store;
