pub mod handlers;
pub mod server;
pub mod templates;

pub use server::{build_router, start_server};
