pub mod app;
pub mod health;

pub use app::{root, status};
pub use health::{health_check, lib_info, metrics_endpoint, version};
