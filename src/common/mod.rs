pub mod clock;
pub mod error;
pub mod location;
pub mod tags;
pub mod upload;
pub mod videos;
