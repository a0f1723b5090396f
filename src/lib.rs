// Library crate for the binary and the integration tests.

pub mod api;
pub mod catalog;
pub mod charts;
pub mod config;
pub mod diagnosis;
pub mod display;
pub mod error;
pub mod form;
pub mod lifecycle;
pub mod model;
pub mod notifications;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
