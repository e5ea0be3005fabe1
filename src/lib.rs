//! Unified vote and bookmark interaction engine.
//!
//! One record per (item, user) pair holds the user's vote and bookmark flag.
//! [`services::InteractionService`] toggles it, [`services::InteractionQueryService`]
//! reads it back, and [`services::InteractionStore`] abstracts the document store.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
