pub mod api;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod keepalive;
pub mod kv;
pub mod ledger;
pub mod models;
pub mod remote;
pub mod response;
pub mod status;
pub mod store;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
