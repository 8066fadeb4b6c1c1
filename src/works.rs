use rand::seq::SliceRandom;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::history::PostHistory;
use crate::security::InputValidator;

/// One illustrated work: a directory of page images in posting order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Work {
    pub name: String,
    pub pages: Vec<PathBuf>,
}

impl Work {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Scans the immediate subdirectories of `root` for works. Directories with
/// no page images are left out.
pub fn discover_works(root: &Path) -> AppResult<Vec<Work>> {
    if !root.is_dir() {
        return Err(AppError::RootDirMissing {
            path: root.display().to_string(),
        });
    }

    let mut works = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        match collect_pages(&path) {
            Ok(pages) if pages.is_empty() => {
                log::debug!("No page images in {}, skipping", path.display());
            }
            Ok(pages) => {
                log::debug!("Found work '{}' with {} pages", name, pages.len());
                works.push(Work { name, pages });
            }
            Err(e) => {
                log::warn!("Skipping unreadable directory {}: {}", path.display(), e);
            }
        }
    }

    works.sort_by(|a, b| a.name.cmp(&b.name));

    log::info!(
        "Discovered {} works ({} pages) under {}",
        works.len(),
        works.iter().map(Work::page_count).sum::<usize>(),
        root.display()
    );

    Ok(works)
}

fn collect_pages(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut pages = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && InputValidator::has_page_extension(&path) {
            pages.push(path);
        }
    }

    pages.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pages)
}

/// Chooses which work gets posted. `history` is passed so a policy can weigh
/// past posts; `UniformSelection` ignores it.
pub trait SelectionPolicy {
    fn select<'a, R: Rng + ?Sized>(
        &self,
        works: &'a [Work],
        history: &PostHistory,
        rng: &mut R,
    ) -> Option<&'a Work>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UniformSelection;

impl SelectionPolicy for UniformSelection {
    fn select<'a, R: Rng + ?Sized>(
        &self,
        works: &'a [Work],
        _history: &PostHistory,
        rng: &mut R,
    ) -> Option<&'a Work> {
        works.choose(rng)
    }
}

/// Uniform random pick; `None` only when `works` is empty.
pub fn select_work<'a, R: Rng + ?Sized>(
    works: &'a [Work],
    history: &PostHistory,
    rng: &mut R,
) -> Option<&'a Work> {
    UniformSelection.select(works, history, rng)
}

pub fn find_work<'a>(works: &'a [Work], name: &str) -> AppResult<&'a Work> {
    works
        .iter()
        .find(|work| work.name == name)
        .ok_or_else(|| AppError::UnknownWork {
            name: name.to_string(),
        })
}
