pub mod config;
pub mod install;
pub mod paths;
pub mod versions;
