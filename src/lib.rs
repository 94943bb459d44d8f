pub mod config;
pub mod gviz;
pub mod http_client;
pub mod provider;
pub mod reconcile;
pub mod rotation;
pub mod source;
pub mod state;
