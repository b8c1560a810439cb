//! # dirpage
//!
//! Resolves a request path against a directory tree of menus and articles
//! and hands back everything a page template needs: the menu levels, the
//! article list, the content article, an optional index article, and the
//! page's modification time. Article bodies are markdown, rendered lazily
//! and sanitized.
//!
//! # Content Tree
//!
//! Every directory that carries a metadata descriptor is an entry. An entry
//! with a markdown body next to its descriptor is an article; without one it
//! is a menu node.
//!
//! ```text
//! pages/
//! ├── menu1/
//! │   ├── meta.json              # {"Title": "Menu 1", "Priority": 2}
//! │   ├── article1/
//! │   │   ├── meta.json          # {"Title": "First", "Date": "2024-01-01 10:00"}
//! │   │   └── article.md
//! │   └── article2/
//! │       ├── meta.json
//! │       └── article.md
//! ├── menu2/
//! │   └── meta.json
//! └── static/                    # no descriptor: not an entry
//! ```
//!
//! A request for `/menu1/article1` walks `/menu1/article1` → `/menu1` → `/`
//! and collects the menu nodes of each level, the articles of the first
//! level that has any, and the content article among them.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Entry point: backend plus config, page resolution, whole-tree check |
//! | [`page`] | Upward tree walk assembling a [`Page`] |
//! | [`listing`] | One directory level as sorted entries |
//! | [`entry`] | One menu node or article loaded from its directory |
//! | [`meta`] | Metadata descriptor and the `YYYY-MM-DD HH:MM` timestamp |
//! | [`render`] | Lazy markdown rendering: heading shift, image titles, headless tables, sanitizing |
//! | [`backend`] | Read-only storage trait with filesystem and in-memory implementations |
//! | [`paths`] | Logical `/`-rooted path cleaning and prefix tests |
//! | [`config`] | `config.toml` loading, merging over stock defaults, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Caching Between Requests
//!
//! Every request lists the directories on its path again. The tree can change
//! on disk between requests and the next page reflects it without any
//! invalidation logic. Within one request the article bodies are the only
//! thing memoized, and only when something asks for them.
//!
//! ## Hidden Entries
//!
//! An entry marked hidden is left out of every listing except the one for a
//! request naming its exact path. Drafts can be previewed by URL without
//! showing up in navigation.
//!
//! ## Trusted Bodies
//!
//! Rendered HTML is sanitized unless the entry's descriptor sets `Unsafe`.
//! Content authors opt in per article; the default is safe.
//!
//! ## Navigation By Position
//!
//! Articles don't hold references to their neighbours. [`Page::next`] and
//! [`Page::prev`] take a position in [`Page::articles`] and look one step
//! either way, so a page is a plain owned tree with no back-references.

pub mod backend;
pub mod config;
pub mod entry;
pub mod listing;
pub mod meta;
pub mod output;
pub mod page;
pub mod paths;
pub mod render;
pub mod site;

pub use entry::Entry;
pub use page::Page;
pub use site::Site;

#[cfg(test)]
pub(crate) mod test_helpers;
