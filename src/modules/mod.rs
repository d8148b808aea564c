pub mod jobs;
pub mod monitor;
pub mod resources;
pub mod setup;
pub mod submit;
pub mod upload;
