pub mod api;
pub mod commands;
