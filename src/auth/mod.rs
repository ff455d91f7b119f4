use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod oauth;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod roles;
pub mod session;
pub mod tokens;
mod validate;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
