use env_logger::{Builder, Env, Target};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Copies every formatted log line to stderr and to an append-only file.
pub struct LogTee<W: Write> {
    file: W,
}

impl<W: Write> LogTee<W> {
    pub fn new(file: W) -> Self {
        Self { file }
    }
}

impl<W: Write> Write for LogTee<W> {
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

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `<timestamp> - <LEVEL> - <message>` on the console and in `log_file`.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logger(log_file: &Path) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(buf, "{} - {} - {}", buf.timestamp(), record.level(), record.args())
    });

    let file_error = match open_log_file(log_file) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(LogTee::new(file))));
            None
        }
        Err(error) => {
            builder.target(Target::Stderr);
            Some(error)
        }
    };
    builder.init();

    if let Some(error) = file_error {
        log::warn!("Could not open log file {}, logging to console only: {error}", log_file.display());
    }
}
