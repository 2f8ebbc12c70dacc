pub mod layout;
pub mod projects;

pub use layout::{not_found_page, error_page};
