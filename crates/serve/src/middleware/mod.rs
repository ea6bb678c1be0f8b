//! Middleware for the ClawSearch HTTP surface

pub mod auth;

pub use auth::{
    api_key_middleware, request_id_middleware, ApiKeys, API_KEY_HEADER, REQUEST_ID_HEADER,
};
