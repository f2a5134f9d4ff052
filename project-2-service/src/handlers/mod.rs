pub mod app;
pub mod health;
pub mod rag;

pub use app::root;
pub use health::{health_check, lib_info, metrics_endpoint, version};
pub use rag::{index_documents, query_rag};
