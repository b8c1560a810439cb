//! Shared test utilities for the dirpage test suite.
//!
//! Builds in-memory content trees and offers lookups over assembled pages.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//! use serde_json::json;
//!
//! let site = TreeBuilder::new()
//!     .entry("/menu1", json!({"Title": "Menu"}), None)
//!     .article("/menu1/article1", 5, "2024-01-01 10:00")
//!     .site();
//!
//! let page = site.page("/menu1/article1").unwrap();
//! assert_eq!(links(page.articles()), ["/menu1/article1"]);
//! ```

use serde_json::json;
use std::sync::Arc;

use crate::backend::MemoryBackend;
use crate::config::SiteConfig;
use crate::entry::Entry;
use crate::paths;
use crate::site::Site;

// =========================================================================
// Tree setup
// =========================================================================

/// Builder for an in-memory content tree using the default file names.
pub struct TreeBuilder {
    backend: MemoryBackend,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            backend: MemoryBackend::new().with_dir("/"),
        }
    }

    /// An entry directory with the given descriptor and optional body.
    pub fn entry(self, path: &str, meta: serde_json::Value, body: Option<&str>) -> Self {
        let mut builder = self.raw(&paths::join(path, "meta.json"), meta.to_string());
        if let Some(body) = body {
            builder = builder.raw(&paths::join(path, "article.md"), body);
        }
        builder
    }

    /// A menu node titled after its last path segment.
    pub fn menu(self, path: &str, priority: i64) -> Self {
        let title = paths::file_name(path).to_string();
        self.entry(path, json!({"Title": title, "Priority": priority}), None)
    }

    /// An article titled after its last path segment.
    pub fn article(self, path: &str, priority: i64, date: &str) -> Self {
        let title = paths::file_name(path).to_string();
        let body = format!("# {title}\n");
        self.entry(
            path,
            json!({"Title": title, "Priority": priority, "Date": date}),
            Some(&body),
        )
    }

    pub fn raw(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.backend.insert_file(path, contents, None);
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.backend = self.backend.with_dir(path);
        self
    }

    pub fn site(self) -> Site {
        self.site_with(SiteConfig::default())
    }

    pub fn site_with(self, config: SiteConfig) -> Site {
        Site::from_parts(Arc::new(self.backend), config)
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Links of a run of entries, in order.
pub fn links(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(Entry::link).collect()
}

/// Links of the active entries, in order.
pub fn active_links(entries: &[Entry]) -> Vec<&str> {
    entries
        .iter()
        .filter(|e| e.is_active())
        .map(Entry::link)
        .collect()
}
