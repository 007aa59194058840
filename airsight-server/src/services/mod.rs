mod directory_service;
pub mod simulate;

pub use directory_service::*;
