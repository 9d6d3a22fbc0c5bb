pub mod action;
pub mod api;
pub mod status;
