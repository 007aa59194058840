mod device;
mod reading;

pub use device::*;
pub use reading::*;

use serde::{Deserialize, Serialize};

/// Where the data in a response came from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Readings reported by real devices
    #[default]
    Live,
    /// Synthetic substitute returned while the backend is unreachable
    Placeholder,
    /// Generated demonstration data
    Mock,
}
