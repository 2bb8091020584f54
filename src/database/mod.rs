pub mod directory;
pub mod manager;
pub mod memory;
pub mod models;

pub use directory::{Directory, PgDirectory};
pub use manager::{Database, DatabaseError};
pub use memory::MemoryDirectory;
