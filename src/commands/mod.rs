pub mod check;
pub mod choose;
pub mod config;
pub mod fetch;
pub mod host;
pub mod patch;
