//! Sources of result-table HTML, one fragment per page in display order.

use crate::error::FetchError;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// A finite, non-restartable sequence of result pages.
///
/// Returns `Ok(None)` once the last page has been handed out, and keeps
/// returning `Ok(None)` afterwards.
pub trait PageSource {
    fn next_page(&mut self) -> Result<Option<String>, FetchError>;
}

/// Pages already held in memory
#[derive(Debug, Default)]
pub struct StaticPages {
    pages: VecDeque<String>,
}

impl StaticPages {
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }
}

impl PageSource for StaticPages {
    fn next_page(&mut self) -> Result<Option<String>, FetchError> {
        Ok(self.pages.pop_front())
    }
}

/// Saved result pages in a directory, read lazily one file per page
#[derive(Debug)]
pub struct SnapshotDir {
    files: VecDeque<PathBuf>,
}

impl SnapshotDir {
    pub fn open(dir: &Path) -> Result<Self, FetchError> {
        if !dir.is_dir() {
            return Err(FetchError::MissingPages(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                let ext = path.extension()?.to_str()?.to_ascii_lowercase();
                (path.is_file() && (ext == "html" || ext == "htm")).then_some(path)
            })
            .collect();
        files.sort_by_key(|path| page_order(path));

        Ok(Self {
            files: files.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl PageSource for SnapshotDir {
    fn next_page(&mut self) -> Result<Option<String>, FetchError> {
        let Some(path) = self.files.pop_front() else {
            return Ok(None);
        };
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| FetchError::PageRead { path, source })
    }
}

/// Sort key putting `page-2.html` before `page-10.html`
fn page_order(path: &Path) -> (Option<u64>, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let number = stem
        .chars()
        .rev()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect::<String>()
        .parse()
        .ok();
    (number, stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_pages_are_consumed_once() {
        let mut pages = StaticPages::new(["<tr></tr>", "<tr></tr><tr></tr>"]);
        assert!(pages.next_page().unwrap().is_some());
        assert!(pages.next_page().unwrap().is_some());
        assert!(pages.next_page().unwrap().is_none());
        assert!(pages.next_page().unwrap().is_none());
    }

    #[test]
    fn snapshot_dir_reads_pages_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("page-10.html", "ten"),
            ("page-2.html", "two"),
            ("page-1.html", "one"),
            ("notes.txt", "ignored"),
        ] {
            fs::write(dir.path().join(name), body).unwrap();
        }

        let mut source = SnapshotDir::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);

        let mut seen = Vec::new();
        while let Some(page) = source.next_page().unwrap() {
            seen.push(page);
        }
        assert_eq!(seen, ["one", "two", "ten"]);
    }

    #[test]
    fn missing_snapshot_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            SnapshotDir::open(&missing),
            Err(FetchError::MissingPages(path)) if path == missing
        ));
    }
}
