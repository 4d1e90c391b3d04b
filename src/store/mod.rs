mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod traits;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
pub use traits::*;
