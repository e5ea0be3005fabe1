pub mod clock;
pub mod interaction_key;
pub mod middleware;
