pub mod markdown;
pub mod uploads;
