//! Logger setup: every record goes to stderr and to the activity log file

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writer duplicating output to stderr and an append-only file
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn builder() -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} - {} - {} - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            record.target(),
            record.level(),
            record.args()
        )
    });
    builder
}

/// Initialize logging with INFO as default if RUST_LOG not set.
///
/// Falls back to stderr only when the log file cannot be opened.
pub fn init(log_file: &Path) {
    let mut builder = builder();

    let opened = campaign_core::paths::ensure_parent_dir(log_file).and_then(|_| {
        OpenOptions::new().create(true).append(true).open(log_file)
    });

    match opened {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
            builder.init();
        }
        Err(e) => {
            builder.init();
            log::warn!("Could not open log file {}: {}", log_file.display(), e);
        }
    }
}
