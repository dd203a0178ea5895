pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use docs::ApiDoc;
pub use error::ApiError;
pub use server::{create_router, serve};
