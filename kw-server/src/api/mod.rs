pub mod action;
pub mod serve;
pub mod service_config;
pub mod services;
