pub mod app_config;
pub mod error;
pub mod time_util;
pub mod trading;
