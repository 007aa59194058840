pub mod directory;
pub mod error;
pub mod fetcher;
pub mod transport;

pub use directory::load_devices;
pub use error::{FetchError, Result};
pub use fetcher::{FetchPhase, FetchState, FetcherOptions, ReadingFetcher};
pub use transport::{HttpTransport, SensorTransport};
