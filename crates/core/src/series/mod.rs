pub mod memory;
pub mod traits;

pub use memory::MemoryFixingStore;
pub use traits::FixingSeries;
