//! One menu item or article, built from one content directory.
//!
//! A directory becomes an [`Entry`] when it carries a metadata descriptor.
//! Whether it is an article or a pure menu node is decided by the presence
//! of a markdown body next to the descriptor:
//!
//! ```text
//! menu1/
//! ├── meta.json          → Entry "/menu1", a menu node (no body)
//! └── article1/
//!     ├── meta.json
//!     └── article.md     → Entry "/menu1/article1", an article
//! ```
//!
//! Articles carry a [`LazyRenderer`]; nothing is read or converted until a
//! caller asks for the HTML.

use std::io;
use std::sync::Once;
use thiserror::Error;

use crate::meta::{Meta, MetaError, Timestamp, TimestampError};
use crate::paths;
use crate::render::{LazyRenderer, RenderError};
use crate::site::Site;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("no metadata at {0:?}")]
    NotFound(String),
    #[error("entry {0:?} is hidden")]
    Hidden(String),
    #[error("malformed metadata in {path:?}: {source}")]
    MalformedMetadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed timestamp in {path:?}: {source}")]
    MalformedTimestamp {
        path: String,
        #[source]
        source: TimestampError,
    },
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl EntryError {
    /// Conditions a listing drops silently instead of failing on.
    pub fn is_skippable(&self) -> bool {
        matches!(self, EntryError::NotFound(_) | EntryError::Hidden(_))
    }
}

/// Menu node or article.
#[derive(Debug)]
pub enum EntryKind {
    Menu,
    Article(LazyRenderer),
}

#[derive(Debug)]
pub struct Entry {
    meta: Meta,
    link: String,
    active: bool,
    kind: EntryKind,
    render_logged: Once,
}

impl Entry {
    /// Build the entry for directory `path` while `active_path` is being
    /// requested. Both paths must already be cleaned.
    pub fn load(site: &Site, path: &str, active_path: &str) -> Result<Entry, EntryError> {
        let backend = site.backend();
        let files = &site.config().files;

        let meta_path = paths::join(path, &files.meta);
        let bytes = backend.read(&meta_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                EntryError::NotFound(meta_path.clone())
            } else {
                EntryError::Io {
                    path: meta_path.clone(),
                    source,
                }
            }
        })?;
        let meta = Meta::from_slice(&bytes).map_err(|err| match err {
            MetaError::Malformed(source) => EntryError::MalformedMetadata {
                path: meta_path.clone(),
                source,
            },
            MetaError::Timestamp(source) => EntryError::MalformedTimestamp {
                path: meta_path.clone(),
                source,
            },
        })?;

        // Hidden entries are reachable only by their exact path.
        if meta.hidden && active_path != path {
            return Err(EntryError::Hidden(path.to_string()));
        }

        let article_path = paths::join(path, &files.article);
        let kind = match backend.open(&article_path) {
            Ok(_) => EntryKind::Article(LazyRenderer::new(
                backend.clone(),
                article_path,
                meta.unsafe_html,
                site.config().render.clone(),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => EntryKind::Menu,
            Err(source) => {
                return Err(EntryError::Io {
                    path: article_path,
                    source,
                });
            }
        };

        Ok(Entry {
            active: paths::contains(path, active_path),
            link: path.to_string(),
            meta,
            kind,
            render_logged: Once::new(),
        })
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    pub fn author(&self) -> &str {
        &self.meta.author
    }

    pub fn date(&self) -> Timestamp {
        self.meta.date
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    pub fn description(&self) -> &str {
        &self.meta.desc
    }

    pub fn priority(&self) -> i64 {
        self.meta.priority
    }

    pub fn is_hidden(&self) -> bool {
        self.meta.hidden
    }

    pub fn is_unsafe(&self) -> bool {
        self.meta.unsafe_html
    }

    pub fn is_index(&self) -> bool {
        self.meta.is_index
    }

    pub fn is_menu(&self) -> bool {
        self.meta.is_menu
    }

    pub fn extra_style(&self) -> &[String] {
        &self.meta.extra_style
    }

    pub fn extra_script(&self) -> &[String] {
        &self.meta.extra_script
    }

    /// The directory path, used both as identifier and as URL.
    pub fn link(&self) -> &str {
        &self.link
    }

    /// On the path to the requested resource, or chosen as its content.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn mark_active(&mut self) {
        self.active = true;
    }

    pub fn is_article(&self) -> bool {
        matches!(self.kind, EntryKind::Article(_))
    }

    /// Rendered body. `None` for menu nodes.
    pub fn render(&self) -> Option<Result<&str, &RenderError>> {
        match &self.kind {
            EntryKind::Article(renderer) => Some(renderer.render()),
            EntryKind::Menu => None,
        }
    }

    /// Rendered body for templates: empty for menu nodes and on failure.
    /// A failure is logged the first time it is seen.
    pub fn html(&self) -> &str {
        match self.render() {
            Some(Ok(html)) => html,
            Some(Err(err)) => {
                self.render_logged.call_once(|| {
                    tracing::warn!(link = %self.link, error = %err, "article failed to render");
                });
                ""
            }
            None => "",
        }
    }
}
