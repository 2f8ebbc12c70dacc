pub mod demo_media;
pub mod health;
pub mod project;
pub mod technology;
pub mod upload;
