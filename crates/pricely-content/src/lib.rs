//! Content CRUD interface (§4.8) and the session services built on top of
//! it (§4.7: signup/login, salted-in-name-only SHA-256 hashing per the
//! spec's explicit formula).

pub mod error;
pub mod session;
pub mod store;

pub use error::ContentError;
pub use session::{login, signup, User};
pub use store::memory::MemoryContentStore;
pub use store::postgres::PgContentStore;
pub use store::{is_known_table, ContentStore, Row, KNOWN_TABLES};
