pub mod cache;
pub mod health;

pub use cache::{delete_handler, get_handler, set_handler, set_with_ttl_handler};
pub use health::{health_handler, ping_handler};
