use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use sysinfo::{Pid, System};

use crate::errors::{AppError, AppResult};

/// Process names of this bot contain this (the binary, and `cargo test` harnesses)
const PROCESS_NAME_HINT: &str = "manga";

/// Lock file holding the PID of the run that owns the history file.
/// Removed again when the guard is dropped.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: &Path) -> AppResult<Self> {
        Self::acquire_with(path, is_bot_process)
    }

    /// `is_running` decides whether the PID recorded in an existing lock
    /// still belongs to a live run of this bot.
    fn acquire_with(path: &Path, is_running: impl Fn(u32) -> bool) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let current_pid = std::process::id();
        let mut holder = None;

        // Second attempt only after removing a stale lock
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    write!(file, "{}", current_pid)?;
                    log::info!("Created lock file with PID: {}", current_pid);
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    holder = read_lock_pid(path);
                    match holder {
                        Some(pid) if pid != current_pid && is_running(pid) => {
                            log::error!("Lock file {} is held by PID {}", path.display(), pid);
                            return Err(AppError::AlreadyRunning { pid });
                        }
                        _ => {
                            log::warn!(
                                "Removing stale lock file {} (PID {:?})",
                                path.display(),
                                holder
                            );
                            match fs::remove_file(path) {
                                Ok(()) => {}
                                Err(e) if e.kind() == ErrorKind::NotFound => {}
                                Err(e) => return Err(e.into()),
                            }
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Another run recreated the lock between our removal and retry
        let pid = read_lock_pid(path).or(holder).unwrap_or_default();
        log::error!("Lock file {} was taken by another run", path.display());
        Err(AppError::AlreadyRunning { pid })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        cleanup_lock_file(&self.path);
    }
}

fn read_lock_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// A recorded PID only counts as a live run when the process still exists
/// and is actually this bot; PIDs get reused after a crash.
fn is_bot_process(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes();

    match system.process(Pid::from(pid as usize)) {
        Some(process) => process
            .name()
            .to_lowercase()
            .contains(PROCESS_NAME_HINT),
        None => false,
    }
}

pub fn cleanup_lock_file(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("Failed to remove lock file: {}", e);
        } else {
            log::info!("Cleaned up lock file");
        }
    }
}

/// Removes the lock file on Ctrl+C before exiting
pub fn register_cleanup_handler(lock_path: PathBuf) {
    if let Err(e) = ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, cleaning up...");
        cleanup_lock_file(&lock_path);
        std::process::exit(1);
    }) {
        log::warn!("Failed to register Ctrl+C handler: {}", e);
    }
}
