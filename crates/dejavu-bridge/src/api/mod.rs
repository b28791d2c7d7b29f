pub mod engine;
pub mod event;
pub mod handler;
pub mod monitor;
pub mod registry;
pub mod verify;
