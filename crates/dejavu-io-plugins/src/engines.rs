#[cfg(feature = "process_engine")]
pub mod process_engine;
