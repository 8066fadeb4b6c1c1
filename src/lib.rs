pub mod auth;
pub mod commands;
pub mod config;
pub mod errors;
pub mod history;
pub mod image_processor;
pub mod logging;
pub mod security;
pub mod single_instance;
pub mod uploader;
pub mod works;
