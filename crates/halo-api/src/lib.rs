//! halo-api: HTTP API layer for Halo
//!
//! JSON routes over the pool registry, swap router, farm, error translation
//! and bridge form.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::AppState;
