pub mod aggregation;
mod bounded;
pub mod domain;
pub mod error;
pub mod guard;
pub mod ports;
pub mod stores;
pub mod workflows;

pub use aggregation::{rating_average, AggregationEngine, Direction, SortKey, SortOrder};
pub use bounded::DEFAULT_STORE_TIMEOUT;
pub use domain::{
    Movie, MovieChanges, MovieDraft, MovieInfo, MoviePatch, NewMovie, NewReview, NewUser, Rating,
    RatingRollup, ReviewEntry, User, UserCredentials, WatchedEntry,
};
pub use error::{CatalogError, CatalogResult};
pub use ports::{
    BlobStore, CredentialHasher, EngagementRepository, MovieRepository, PortError, PortResult,
    RatingAggregator, TokenError, TokenService, UserRepository,
};
pub use stores::{CatalogStore, EngagementStore, IdentityStore};
pub use workflows::{CatalogPorts, CatalogService, Registration};
