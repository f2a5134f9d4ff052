pub mod app;
pub mod health;

pub use app::root;
pub use health::{health_check, lib_info, metrics_endpoint, version};
