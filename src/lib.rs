pub mod app;
pub mod cli;
pub mod config;
pub mod ecs;
pub mod events;
pub mod forces;
pub mod inspector;
pub mod interaction;
pub mod notice;
pub mod parts;
pub mod scene;
pub mod schema;

pub use app::{RunMode, Sandbox};
