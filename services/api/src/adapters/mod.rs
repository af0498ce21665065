pub mod blob;
pub mod db;
pub mod memory;
pub mod password;
pub mod tokens;

pub use blob::LocalBlobStore;
pub use db::DbAdapter;
pub use memory::MemoryAdapter;
pub use password::Argon2Hasher;
pub use tokens::JwtTokenAdapter;
