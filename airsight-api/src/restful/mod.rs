mod response;
mod sensor;

pub use response::*;
pub use sensor::*;
