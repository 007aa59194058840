pub mod models;
pub mod quality;
pub mod restful;
