//! Listing one directory level as sorted entries.
//!
//! ## Ordering
//!
//! Entries sort by, most significant first:
//!
//! 1. index entries after everything else
//! 2. higher priority first
//! 3. newer date first
//!
//! The sort is stable and children are visited in name order, so full ties
//! come out alphabetically and the result never depends on the backend's
//! listing order.

use std::cmp::Ordering;
use std::io;
use thiserror::Error;

use crate::entry::{Entry, EntryError};
use crate::paths;
use crate::site::Site;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("cannot list directory {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Entry(#[from] EntryError),
}

/// Entries of the subdirectories of `dir`, sorted.
///
/// Hidden entries and directories without metadata are skipped. Any other
/// entry failure fails the whole listing. A missing `dir` lists as empty.
pub fn list_entries(site: &Site, dir: &str, active_path: &str) -> Result<Vec<Entry>, ListError> {
    let mut children = match site.backend().list(dir) {
        Ok(children) => children,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(dir, "directory does not exist, listing as empty");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ListError::Io {
                path: dir.to_string(),
                source,
            });
        }
    };
    children.retain(|c| c.is_dir);
    children.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = Vec::with_capacity(children.len());
    for child in children {
        let path = paths::join(dir, &child.name);
        match Entry::load(site, &path, active_path) {
            Ok(entry) => entries.push(entry),
            Err(err) if err.is_skippable() => {
                tracing::debug!(%path, reason = %err, "skipping entry");
            }
            Err(err) => return Err(err.into()),
        }
    }

    sort_entries(&mut entries);
    tracing::debug!(dir, count = entries.len(), "listed entries");
    Ok(entries)
}

/// The listing order: non-index first, then priority, then date, both descending.
pub fn compare(a: &Entry, b: &Entry) -> Ordering {
    a.is_index()
        .cmp(&b.is_index())
        .then_with(|| b.priority().cmp(&a.priority()))
        .then_with(|| b.date().cmp(&a.date()))
}

pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(compare);
}

/// Split into menu nodes and articles, keeping relative order.
pub fn split(entries: Vec<Entry>) -> (Vec<Entry>, Vec<Entry>) {
    entries.into_iter().partition(|e| !e.is_article())
}
