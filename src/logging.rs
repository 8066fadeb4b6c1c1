use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::AppResult;

/// Rotate once the log grows past this size
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
/// Rotated generations kept next to the live log
pub const KEEP_ROTATED: usize = 3;

/// Writes every log line to stderr and, when it could be opened, the log file
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        match &mut self.file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Sets up env_logger with console + file output. `RUST_LOG` overrides `level`.
/// A log file that cannot be rotated or opened only costs the file copy:
/// logging continues on stderr.
pub fn init_logging(log_file: &Path, level: &str) {
    let (file, file_error) = match open_log_file(log_file) {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };
    let filter = level.parse().unwrap_or(log::LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(TeeWriter { file })))
        .init();

    if let Some(e) = file_error {
        log::warn!(
            "Cannot use log file {}, logging to stderr only: {}",
            log_file.display(),
            e
        );
    }
}

fn open_log_file(log_file: &Path) -> AppResult<File> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    rotate_if_needed(log_file, MAX_LOG_BYTES, KEEP_ROTATED)?;
    Ok(OpenOptions::new().create(true).append(true).open(log_file)?)
}

fn rotated_path(log_file: &Path, generation: usize) -> PathBuf {
    let mut name = log_file.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}", generation));
    log_file.with_file_name(name)
}

/// Shifts `bot.log` -> `bot.log.1` -> `bot.log.2` ... when the live file is
/// larger than `max_bytes`. The oldest generation is dropped.
pub fn rotate_if_needed(log_file: &Path, max_bytes: u64, keep: usize) -> AppResult<bool> {
    let size = match fs::metadata(log_file) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    if size <= max_bytes || keep == 0 {
        return Ok(false);
    }

    let oldest = rotated_path(log_file, keep);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for generation in (1..keep).rev() {
        let from = rotated_path(log_file, generation);
        if from.exists() {
            fs::rename(&from, rotated_path(log_file, generation + 1))?;
        }
    }

    fs::rename(log_file, rotated_path(log_file, 1))?;
    Ok(true)
}
