pub mod actor;
pub mod common;
pub mod model;
pub mod snap_engine;
pub mod sys;
