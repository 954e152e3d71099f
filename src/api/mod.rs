pub mod auth;
mod error;
pub mod models;
mod pages;
mod server;
pub mod services;
pub mod state;

pub use auth::{Credentials, CredentialsError};
pub use error::ApiError;
pub use server::{router, run};
pub use state::AppState;
