pub mod events;
pub mod handler;
pub mod service;
pub mod tracker;
