pub mod app_state;
pub mod json;
pub mod logging;
