pub mod upload;
pub mod user;
pub mod video;
