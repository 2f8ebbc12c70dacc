pub mod api;
pub mod json_error;
pub mod page_error;
pub mod pages;
pub mod system;
