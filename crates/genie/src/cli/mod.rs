pub mod appraise;
pub mod config;
pub mod interactive;
