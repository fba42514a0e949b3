pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod utils;
pub mod workflow;
