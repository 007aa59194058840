mod schema;
mod settings;
mod storage;

use std::path::PathBuf;
use std::{env, io};

pub use schema::SchemaManager;
pub use settings::{Backend, Database, Directory, Logger, Sensors, Server, Settings};
pub use storage::Storage;

/// Resolves `path` against the working directory unless it is absolute.
pub fn normalize_path(path: &str) -> io::Result<PathBuf> {
    let path_buf = PathBuf::from(path);

    Ok(if path_buf.is_absolute() {
        path_buf
    } else {
        env::current_dir()?.join(path_buf)
    })
}
