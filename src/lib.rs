pub mod commands;
pub mod config;
pub mod error;
pub mod feed;
pub mod framework;
pub mod http;
pub mod inspect;
pub mod nuspec;
pub mod package;
pub mod render;
pub mod runtime;
pub mod version;
