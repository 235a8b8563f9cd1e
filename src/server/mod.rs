pub mod rest;

pub use rest::server::run_rest_server;
