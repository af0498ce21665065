pub mod catalog;
pub mod engagement;
pub mod identity;

pub use catalog::{parse_movie_id, CatalogStore};
pub use engagement::EngagementStore;
pub use identity::{normalize_email, IdentityStore};
