//! The entry point tying storage and configuration together.
//!
//! A [`Site`] is cheap to clone and safe to share between threads; every
//! request builds its own [`Page`] from it and nothing is cached between
//! requests.
//!
//! ```no_run
//! use dirpage::Site;
//!
//! let site = Site::open("./site".as_ref())?;
//! let page = site.page("/blog/first-post")?;
//! if let Some(content) = page.content() {
//!     println!("{}", content.html());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use rayon::prelude::*;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::backend::{Backend, FsBackend};
use crate::config::{self, ConfigError, SiteConfig};
use crate::entry::{Entry, EntryError};
use crate::listing::{self, ListError};
use crate::page::{self, Page, PageError};
use crate::paths;

#[derive(Clone)]
pub struct Site {
    backend: Arc<dyn Backend>,
    config: Arc<SiteConfig>,
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Site {
    pub fn from_parts(backend: Arc<dyn Backend>, config: SiteConfig) -> Self {
        Self {
            backend,
            config: Arc::new(config),
        }
    }

    pub fn new(backend: impl Backend + 'static, config: SiteConfig) -> Self {
        Self::from_parts(Arc::new(backend), config)
    }

    /// Load `config.toml` from `site_root` and serve its content root from disk.
    pub fn open(site_root: &Path) -> Result<Self, ConfigError> {
        let config = config::load_config(site_root)?;
        let backend = FsBackend::new(site_root.join(&config.content_root));
        tracing::debug!(root = %backend.root().display(), "opened site");
        Ok(Self::new(backend, config))
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Load the single entry at `path`.
    pub fn entry(&self, path: &str, active_path: &str) -> Result<Entry, EntryError> {
        Entry::load(self, &paths::clean(path), &paths::clean(active_path))
    }

    /// Sorted entries below `dir`.
    pub fn entries(&self, dir: &str, active_path: &str) -> Result<Vec<Entry>, ListError> {
        listing::list_entries(self, &paths::clean(dir), &paths::clean(active_path))
    }

    /// Resolve the page for a request path.
    pub fn page(&self, path: &str) -> Result<Page, PageError> {
        page::assemble(self, path)
    }

    /// Load every entry in the tree, hidden ones included, and render every
    /// article. Problems are collected rather than returned early.
    pub fn check(&self) -> CheckReport {
        let mut report = CheckReport::default();
        let mut articles = Vec::new();
        self.walk(paths::ROOT, &mut report, &mut articles);

        report.articles = articles.len();
        let failures: Vec<CheckIssue> = articles
            .par_iter()
            .filter_map(|entry| match entry.render()? {
                Ok(_) => None,
                Err(err) => Some(CheckIssue {
                    path: entry.link().to_string(),
                    message: err.to_string(),
                }),
            })
            .collect();
        report.issues.extend(failures);
        report.issues.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            entries = report.entries,
            articles = report.articles,
            issues = report.issues.len(),
            "checked site"
        );
        report
    }

    fn walk(&self, dir: &str, report: &mut CheckReport, articles: &mut Vec<Entry>) {
        let mut children = match self.backend.list(dir) {
            Ok(children) => children,
            Err(e) if e.kind() == io::ErrorKind::NotFound && paths::is_root(dir) => return,
            Err(e) => {
                report.issue(dir, format!("cannot list directory: {e}"));
                return;
            }
        };
        children.retain(|c| c.is_dir);
        children.sort_by(|a, b| a.name.cmp(&b.name));

        for child in children {
            let path = paths::join(dir, &child.name);
            match Entry::load(self, &path, &path) {
                Ok(entry) => {
                    report.entries += 1;
                    if entry.is_article() {
                        articles.push(entry);
                    }
                    self.walk(&path, report, articles);
                }
                Err(EntryError::NotFound(_)) => {
                    tracing::debug!(%path, "no metadata, not descending");
                }
                Err(err) => report.issue(&path, err.to_string()),
            }
        }
    }
}

/// Outcome of [`Site::check`].
#[derive(Debug, Default)]
pub struct CheckReport {
    pub entries: usize,
    pub articles: usize,
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn issue(&mut self, path: &str, message: String) {
        tracing::warn!(%path, %message, "check failed");
        self.issues.push(CheckIssue {
            path: path.to_string(),
            message,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIssue {
    pub path: String,
    pub message: String,
}
