pub mod auth;
pub mod browse;
pub mod edit_term;
pub mod export;
pub mod form;
pub mod import;
pub mod index;
pub mod message;
pub mod not_found;
pub mod search;
pub mod submit;
mod tree;
