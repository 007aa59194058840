pub mod device_handle;
pub mod sensor_handle;

pub use device_handle::*;
pub use sensor_handle::*;
