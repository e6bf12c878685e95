pub mod bulk;
pub mod config;
pub mod error;
pub mod http_handler;
pub mod model;
pub mod pricing;
pub mod response;
pub mod store;
pub mod validate;
