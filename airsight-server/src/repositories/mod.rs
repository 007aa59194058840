mod memory;
mod reading;

pub use memory::MemoryReadingRepository;
pub use reading::ReadingRepository;
