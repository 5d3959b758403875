pub mod memory;
pub mod signal_repository;

pub use memory::MemorySignalStore;
pub use signal_repository::SeaOrmSignalStore;
