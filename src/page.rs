//! Page assembly: walking from the requested path up to the root.
//!
//! For a request like `/menu1/article1` the walk lists three directories,
//! leaf first:
//!
//! ```text
//! /menu1/article1   → children of the article itself (usually none)
//! /menu1            → article1, article2, ...      ← first articles found
//! /                 → menu1, menu2, ...            ← top menu level
//! ```
//!
//! Each level contributes its menu nodes as one menu level. The first
//! level that has articles provides the page's article list, and with it
//! the content (the requested article, or the top-ranked one when the
//! request names none of them) and the optional index article. Menu levels
//! are reversed at the end so they read root first.
//!
//! Levels are independent, so they are listed in parallel and then consumed
//! strictly leaf to root. A failing level fails the page; there is no
//! partial result.

use rayon::prelude::*;
use thiserror::Error;

use crate::entry::Entry;
use crate::listing::{self, ListError};
use crate::meta::Timestamp;
use crate::paths;
use crate::site::Site;

#[derive(Error, Debug)]
#[error("cannot assemble page from {path:?}")]
pub struct PageError {
    pub path: String,
    #[source]
    pub source: ListError,
}

/// Where the content entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentSlot {
    Article(usize),
    Index,
}

/// The resolved page for one request.
#[derive(Debug, Default)]
pub struct Page {
    path: String,
    menu: Vec<Vec<Entry>>,
    articles: Vec<Entry>,
    content: Option<ContentSlot>,
    index: Option<Entry>,
    mod_time: Option<Timestamp>,
}

/// Walk from `requested` to the root and assemble the page.
pub fn assemble(site: &Site, requested: &str) -> Result<Page, PageError> {
    let active_path = paths::clean(requested);
    let dirs = paths::ancestors(&active_path);

    let levels: Vec<Result<Vec<Entry>, ListError>> = dirs
        .par_iter()
        .map(|dir| listing::list_entries(site, dir, &active_path))
        .collect();

    let mut page = Page {
        path: active_path.clone(),
        ..Page::default()
    };
    let mut captured = false;

    for (dir, level) in dirs.iter().zip(levels) {
        let entries = level.map_err(|source| PageError {
            path: dir.to_string(),
            source,
        })?;
        let (menu, articles) = listing::split(entries);

        if !menu.is_empty() {
            page.menu.push(menu);
        }
        if !captured && !articles.is_empty() {
            page.capture(articles, &active_path);
            captured = true;
        }
    }

    page.menu.reverse();
    page.mod_time = page.latest_date();

    tracing::debug!(
        path = %page.path,
        levels = page.menu.len(),
        articles = page.articles.len(),
        content = page.content().map(Entry::link),
        "assembled page"
    );
    Ok(page)
}

impl Page {
    /// Take `articles` (sorted) as the page's article list.
    fn capture(&mut self, mut articles: Vec<Entry>, active_path: &str) {
        while articles.last().is_some_and(Entry::is_index) {
            if let Some(index) = articles.pop() {
                if let Some(previous) = self.index.replace(index) {
                    tracing::warn!(
                        kept = self.index.as_ref().map(Entry::link),
                        dropped = previous.link(),
                        "more than one index article at one level"
                    );
                }
            }
        }
        self.articles = articles;

        let exact = self.articles.iter().position(|a| a.link() == active_path);
        self.content = match exact {
            Some(pos) => Some(ContentSlot::Article(pos)),
            None if self.index.as_ref().is_some_and(|i| i.link() == active_path) => {
                Some(ContentSlot::Index)
            }
            None if !self.articles.is_empty() => {
                self.articles[0].mark_active();
                Some(ContentSlot::Article(0))
            }
            None => {
                if let Some(index) = self.index.as_mut() {
                    index.mark_active();
                }
                self.index.as_ref().map(|_| ContentSlot::Index)
            }
        };
    }

    fn latest_date(&self) -> Option<Timestamp> {
        self.index
            .iter()
            .chain(self.menu.iter().flatten())
            .chain(self.articles.iter())
            .map(Entry::date)
            .max()
    }

    /// The cleaned request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Menu levels, root level first.
    pub fn menu(&self) -> &[Vec<Entry>] {
        &self.menu
    }

    /// Articles of the first level that had any, sorted, index excluded.
    pub fn articles(&self) -> &[Entry] {
        &self.articles
    }

    /// The article to render as page body.
    pub fn content(&self) -> Option<&Entry> {
        match self.content? {
            ContentSlot::Article(pos) => self.articles.get(pos),
            ContentSlot::Index => self.index.as_ref(),
        }
    }

    /// Position of the content in [`Page::articles`], `None` when the
    /// content is the index article or there is none.
    pub fn content_position(&self) -> Option<usize> {
        match self.content? {
            ContentSlot::Article(pos) => Some(pos),
            ContentSlot::Index => None,
        }
    }

    /// The landing article of the level, kept out of [`Page::articles`].
    pub fn index(&self) -> Option<&Entry> {
        self.index.as_ref()
    }

    /// Latest date among all entries on the page.
    pub fn mod_time(&self) -> Option<Timestamp> {
        self.mod_time
    }

    /// Position of the article with `link`.
    pub fn position(&self, link: &str) -> Option<usize> {
        self.articles.iter().position(|a| a.link() == link)
    }

    /// The article after `pos` in listing order (lower ranked, usually older).
    pub fn next(&self, pos: usize) -> Option<&Entry> {
        self.articles.get(pos.checked_add(1)?)
    }

    /// The article before `pos` in listing order (higher ranked, usually newer).
    pub fn prev(&self, pos: usize) -> Option<&Entry> {
        self.articles.get(pos.checked_sub(1)?)
    }

    /// Up to `size` consecutive articles around `pos`, growing one step
    /// toward the front and then one toward the back until full.
    pub fn window(&self, pos: usize, size: usize) -> &[Entry] {
        if pos >= self.articles.len() || size == 0 {
            return &[];
        }
        let (mut lo, mut hi) = (pos, pos + 1);
        while hi - lo < size {
            let mut moved = false;
            if lo > 0 {
                lo -= 1;
                moved = true;
            }
            if hi - lo < size && hi < self.articles.len() {
                hi += 1;
                moved = true;
            }
            if !moved {
                break;
            }
        }
        &self.articles[lo..hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryError;
    use crate::test_helpers::*;
    use serde_json::json;

    /// Two menus at the root, two articles under the first menu.
    fn two_level_site() -> Site {
        TreeBuilder::new()
            .menu("/menu1", 2)
            .menu("/menu2", 1)
            .article("/menu1/article1", 5, "2024-01-01 10:00")
            .article("/menu1/article2", 1, "2024-02-01 10:00")
            .site()
    }

    #[test]
    fn exact_article_request_selects_content() {
        let page = two_level_site().page("/menu1/article1").unwrap();

        let content = page.content().unwrap();
        assert_eq!(content.link(), "/menu1/article1");
        assert_eq!(links(page.articles()), ["/menu1/article1", "/menu1/article2"]);
        assert_eq!(page.content_position(), Some(0));
    }

    #[test]
    fn navigation_follows_listing_order() {
        let page = two_level_site().page("/menu1/article1").unwrap();

        assert_eq!(page.prev(1).unwrap().link(), "/menu1/article1");
        assert_eq!(page.next(0).unwrap().link(), "/menu1/article2");
        assert!(page.prev(0).is_none());
        assert!(page.next(1).is_none());
    }

    #[test]
    fn unmatched_request_defaults_to_top_article() {
        let page = two_level_site().page("/menu1/missing").unwrap();

        let content = page.content().unwrap();
        assert_eq!(content.link(), "/menu1/article1");
        assert!(content.is_active());
        assert!(!page.articles()[1].is_active());
    }

    #[test]
    fn menu_request_defaults_to_top_article() {
        let page = two_level_site().page("/menu1/").unwrap();
        assert_eq!(page.path(), "/menu1");
        assert_eq!(page.content().unwrap().link(), "/menu1/article1");
    }

    #[test]
    fn menu_levels_read_root_first() {
        let site = TreeBuilder::new()
            .menu("/docs", 1)
            .menu("/blog", 2)
            .menu("/docs/guide", 1)
            .menu("/docs/api", 3)
            .article("/docs/guide/intro", 1, "2024-01-01 00:00")
            .site();

        let page = site.page("/docs/guide/intro").unwrap();
        let levels: Vec<Vec<&str>> = page.menu().iter().map(|l| links(l)).collect();
        assert_eq!(
            levels,
            vec![vec!["/blog", "/docs"], vec!["/docs/api", "/docs/guide"]]
        );
    }

    #[test]
    fn active_flags_follow_ancestor_chain() {
        let site = TreeBuilder::new()
            .menu("/a", 1)
            .menu("/ab", 2)
            .menu("/a/b", 1)
            .menu("/a/c", 2)
            .article("/a/b/post", 1, "2024-01-01 00:00")
            .article("/a/b/other", 0, "2024-01-01 00:00")
            .site();

        let page = site.page("/a/b/post").unwrap();
        assert_eq!(active_links(&page.menu()[0]), ["/a"]);
        assert_eq!(active_links(&page.menu()[1]), ["/a/b"]);
        assert_eq!(active_links(page.articles()), ["/a/b/post"]);
    }

    #[test]
    fn first_article_level_wins() {
        let site = TreeBuilder::new()
            .article("/top", 1, "2024-01-01 00:00")
            .menu("/section", 1)
            .article("/section/inner", 1, "2023-01-01 00:00")
            .site();

        let page = site.page("/section/inner").unwrap();
        assert_eq!(links(page.articles()), ["/section/inner"]);
        assert_eq!(page.content().unwrap().link(), "/section/inner");
        // Root articles are not menu entries either.
        assert_eq!(page.menu().len(), 1);
        assert_eq!(links(&page.menu()[0]), ["/section"]);
    }

    #[test]
    fn trailing_index_article_moves_to_index_slot() {
        let site = TreeBuilder::new()
            .article("/blog/first", 3, "2024-01-01 00:00")
            .article("/blog/second", 1, "2024-02-01 00:00")
            .entry(
                "/blog/welcome",
                json!({"Title": "Welcome", "IsIndex": true, "Priority": 10}),
                Some("hi"),
            )
            .menu("/blog", 1)
            .site();

        let page = site.page("/blog").unwrap();
        assert_eq!(page.index().unwrap().link(), "/blog/welcome");
        assert_eq!(links(page.articles()), ["/blog/first", "/blog/second"]);
        assert_eq!(page.content().unwrap().link(), "/blog/first");
    }

    #[test]
    fn requesting_index_article_makes_it_content() {
        let site = TreeBuilder::new()
            .article("/blog/first", 3, "2024-01-01 00:00")
            .entry("/blog/welcome", json!({"IsIndex": true}), Some("hi"))
            .site();

        let page = site.page("/blog/welcome").unwrap();
        assert_eq!(page.content().unwrap().link(), "/blog/welcome");
        assert_eq!(page.content_position(), None);
        assert_eq!(links(page.articles()), ["/blog/first"]);
    }

    #[test]
    fn only_index_articles_fall_back_to_index_content() {
        let site = TreeBuilder::new()
            .entry("/home/landing", json!({"IsIndex": true}), Some("hi"))
            .site();

        let page = site.page("/home").unwrap();
        assert!(page.articles().is_empty());
        let content = page.content().unwrap();
        assert_eq!(content.link(), "/home/landing");
        assert!(content.is_active());
    }

    #[test]
    fn several_index_articles_keep_the_top_ranked() {
        let site = TreeBuilder::new()
            .article("/x/post", 1, "2024-01-01 00:00")
            .entry("/x/i1", json!({"IsIndex": true, "Priority": 5}), Some("a"))
            .entry("/x/i2", json!({"IsIndex": true, "Priority": 1}), Some("b"))
            .site();

        let page = site.page("/x").unwrap();
        assert_eq!(page.index().unwrap().link(), "/x/i1");
        assert_eq!(links(page.articles()), ["/x/post"]);
    }

    #[test]
    fn menu_only_entries_never_become_articles() {
        let site = TreeBuilder::new()
            .menu("/about", 1)
            .article("/news", 1, "2024-01-01 00:00")
            .site();

        let page = site.page("/").unwrap();
        assert_eq!(links(&page.menu()[0]), ["/about"]);
        assert_eq!(links(page.articles()), ["/news"]);
        assert!(page.menu()[0].iter().all(|e| !e.is_article()));
    }

    #[test]
    fn mod_time_is_latest_date_on_page() {
        let site = TreeBuilder::new()
            .entry("/m", json!({"Date": "2025-05-05 05:05"}), None)
            .article("/m/a", 1, "2024-01-01 00:00")
            .entry(
                "/m/idx",
                json!({"IsIndex": true, "Date": "2026-01-01 00:00"}),
                Some("x"),
            )
            .site();

        let page = site.page("/m/a").unwrap();
        assert_eq!(page.mod_time().unwrap().to_string(), "2026-01-01 00:00");
    }

    #[test]
    fn empty_site_has_no_content() {
        let page = TreeBuilder::new().site().page("/").unwrap();
        assert!(page.menu().is_empty());
        assert!(page.articles().is_empty());
        assert!(page.content().is_none());
        assert!(page.mod_time().is_none());
    }

    #[test]
    fn hidden_article_only_appears_when_requested() {
        let site = TreeBuilder::new()
            .article("/blog/public", 1, "2024-01-01 00:00")
            .entry("/blog/draft", json!({"Hidden": true, "Priority": 9}), Some("wip"))
            .site();

        let page = site.page("/blog/public").unwrap();
        assert_eq!(links(page.articles()), ["/blog/public"]);

        let page = site.page("/blog/draft").unwrap();
        assert_eq!(links(page.articles()), ["/blog/draft", "/blog/public"]);
        assert_eq!(page.content().unwrap().link(), "/blog/draft");
    }

    #[test]
    fn broken_level_fails_whole_page() {
        let site = TreeBuilder::new()
            .menu("/ok", 1)
            .entry("/ok/bad", json!({"Date": "tomorrow"}), None)
            .site();

        let err = site.page("/ok/bad").unwrap_err();
        assert_eq!(err.path, "/ok");
        assert!(matches!(
            err.source,
            ListError::Entry(EntryError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn window_grows_front_then_back() {
        let mut builder = TreeBuilder::new();
        for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            builder = builder.article(&format!("/w/{name}"), 10 - i as i64, "2024-01-01 00:00");
        }
        let page = builder.site().page("/w/c").unwrap();

        assert_eq!(links(page.window(2, 3)), ["/w/b", "/w/c", "/w/d"]);
        assert_eq!(links(page.window(2, 2)), ["/w/b", "/w/c"]);
        assert_eq!(links(page.window(0, 3)), ["/w/a", "/w/b", "/w/c"]);
        assert_eq!(links(page.window(4, 3)), ["/w/c", "/w/d", "/w/e"]);
        assert_eq!(page.window(1, 99).len(), 5);
        assert!(page.window(9, 3).is_empty());
    }
}
