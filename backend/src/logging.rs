use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Installs the global logger. `RUST_LOG` overrides the default `info` filter.
/// With `log_file` set, records are appended there instead of stderr.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init().map_err(io::Error::other)
}
