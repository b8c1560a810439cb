//! Markdown to sanitized HTML, computed lazily and at most once.
//!
//! ## Pipeline
//!
//! The body is parsed into a pulldown-cmark event stream and passed through
//! an ordered list of independent passes before HTML is written:
//!
//! 1. [`shift_headings`]: every heading moves down `heading_offset` levels
//!    (capped at h6) so the page chrome keeps `<h1>` to itself.
//! 2. [`caption_images`]: an image without a title takes its alt text as
//!    title, an image without alt text takes its title as alt.
//! 3. [`drop_empty_table_heads`]: a table whose header cells are all blank
//!    is written without a `<thead>`.
//!
//! The result goes through [`sanitize`] unless the entry is marked unsafe.
//!
//! ## Memoization
//!
//! [`LazyRenderer`] holds a [`OnceLock`], so concurrent readers of the same
//! entry block on a single render and every later call returns the stored
//! HTML or the stored error.

use pulldown_cmark::{
    Alignment, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html,
};
use std::fmt;
use std::io::{self, Read};
use std::string::FromUtf8Error;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::backend::Backend;
use crate::config::RenderConfig;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot open markdown file {path:?}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot read markdown file {path:?}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("markdown file {path:?} is not valid UTF-8")]
    Encoding {
        path: String,
        #[source]
        source: FromUtf8Error,
    },
}

/// Renders one article body on first use and remembers the outcome.
pub struct LazyRenderer {
    backend: Arc<dyn Backend>,
    path: String,
    trusted: bool,
    options: RenderConfig,
    cell: OnceLock<Result<String, RenderError>>,
}

impl LazyRenderer {
    /// `trusted` skips sanitizing; set it from the entry's unsafe flag.
    pub fn new(
        backend: Arc<dyn Backend>,
        path: impl Into<String>,
        trusted: bool,
        options: RenderConfig,
    ) -> Self {
        Self {
            backend,
            path: path.into(),
            trusted,
            options,
            cell: OnceLock::new(),
        }
    }

    /// Path of the markdown body.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Whether the body has been rendered (successfully or not).
    pub fn is_rendered(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn render(&self) -> Result<&str, &RenderError> {
        self.cell
            .get_or_init(|| self.run())
            .as_ref()
            .map(String::as_str)
    }

    fn run(&self) -> Result<String, RenderError> {
        let mut reader = self.backend.open(&self.path).map_err(|source| RenderError::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| RenderError::Read {
                path: self.path.clone(),
                source,
            })?;
        let markdown = String::from_utf8(bytes).map_err(|source| RenderError::Encoding {
            path: self.path.clone(),
            source,
        })?;

        let html = markdown_to_html(&markdown, &self.options);
        tracing::debug!(path = %self.path, trusted = self.trusted, "rendered article body");
        if self.trusted {
            Ok(html)
        } else {
            Ok(sanitize(&html))
        }
    }
}

impl fmt::Debug for LazyRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRenderer")
            .field("path", &self.path)
            .field("trusted", &self.trusted)
            .field("rendered", &self.is_rendered())
            .finish()
    }
}

/// Convert markdown to HTML with all rendering passes applied.
/// The output is not sanitized.
pub fn markdown_to_html(markdown: &str, options: &RenderConfig) -> String {
    let mut parser_options = Options::empty();
    if options.tables {
        parser_options.insert(Options::ENABLE_TABLES);
    }
    let events: Vec<Event<'_>> = Parser::new_ext(markdown, parser_options).collect();

    let events = shift_headings(events, options.heading_offset);
    let events = caption_images(events);
    let events = drop_empty_table_heads(events);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Strip everything outside an allow-list suitable for user content:
/// scripts, event handlers, inline styles, `javascript:` URLs.
pub fn sanitize(html: &str) -> String {
    ammonia::clean(html)
}

const HEADING_LEVELS: [HeadingLevel; 6] = [
    HeadingLevel::H1,
    HeadingLevel::H2,
    HeadingLevel::H3,
    HeadingLevel::H4,
    HeadingLevel::H5,
    HeadingLevel::H6,
];

fn deeper(level: HeadingLevel, offset: u8) -> HeadingLevel {
    let current = HEADING_LEVELS
        .iter()
        .position(|l| *l == level)
        .unwrap_or(0);
    let target = (current + usize::from(offset)).min(HEADING_LEVELS.len() - 1);
    HEADING_LEVELS[target]
}

/// Move every heading `offset` levels deeper, capped at h6.
pub fn shift_headings(events: Vec<Event<'_>>, offset: u8) -> Vec<Event<'_>> {
    if offset == 0 {
        return events;
    }
    events
        .into_iter()
        .map(|event| match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => Event::Start(Tag::Heading {
                level: deeper(level, offset),
                id,
                classes,
                attrs,
            }),
            Event::End(TagEnd::Heading(level)) => Event::End(TagEnd::Heading(deeper(level, offset))),
            other => other,
        })
        .collect()
}

/// Plain text of a run of inline events.
fn inline_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }
    text
}

/// Give every image both a title and alt text, copying whichever is set.
pub fn caption_images(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        let (link_type, dest_url, title, id) = match event {
            Event::Start(Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            }) => (link_type, dest_url, title, id),
            other => {
                out.push(other);
                continue;
            }
        };

        // Alt text is everything up to the matching end tag; alt text may
        // itself contain image syntax, hence the depth counter.
        let mut inner = Vec::new();
        let mut depth = 0usize;
        for next in iter.by_ref() {
            match &next {
                Event::Start(Tag::Image { .. }) => depth += 1,
                Event::End(TagEnd::Image) if depth == 0 => break,
                Event::End(TagEnd::Image) => depth -= 1,
                _ => {}
            }
            inner.push(next);
        }

        let alt = inline_text(&inner);
        if alt.is_empty() && !title.is_empty() {
            inner = vec![Event::Text(title.clone())];
        }
        let title = if title.is_empty() && !alt.is_empty() {
            CowStr::from(alt)
        } else {
            title
        };

        out.push(Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }));
        out.extend(inner);
        out.push(Event::End(TagEnd::Image));
    }
    out
}

/// Whether any header cell of a collected table carries text.
fn head_has_text(table: &[Event<'_>]) -> bool {
    let mut in_head = false;
    for event in table {
        match event {
            Event::Start(Tag::TableHead) => in_head = true,
            Event::End(TagEnd::TableHead) => return false,
            Event::Text(t) | Event::Code(t) | Event::InlineHtml(t) | Event::Html(t)
                if in_head && !t.trim().is_empty() =>
            {
                return true;
            }
            Event::Start(Tag::Image { .. }) if in_head => return true,
            _ => {}
        }
    }
    false
}

fn alignment_attr(alignment: Option<&Alignment>) -> &'static str {
    match alignment {
        Some(Alignment::Left) => " style=\"text-align: left\"",
        Some(Alignment::Center) => " style=\"text-align: center\"",
        Some(Alignment::Right) => " style=\"text-align: right\"",
        Some(Alignment::None) | None => "",
    }
}

/// Write a table's body rows as HTML, skipping its header row.
fn headless_table_html(alignments: &[Alignment], table: Vec<Event<'_>>) -> String {
    let mut out = String::from("<table>\n<tbody>\n");
    let mut in_head = false;
    let mut column = 0usize;
    let mut cell: Vec<Event<'_>> = Vec::new();
    let mut in_cell = false;

    for event in table {
        match event {
            Event::Start(Tag::TableHead) => in_head = true,
            Event::End(TagEnd::TableHead) => in_head = false,
            _ if in_head => {}
            Event::Start(Tag::TableRow) => {
                column = 0;
                out.push_str("<tr>");
            }
            Event::End(TagEnd::TableRow) => out.push_str("</tr>\n"),
            Event::Start(Tag::TableCell) => {
                in_cell = true;
                cell.clear();
            }
            Event::End(TagEnd::TableCell) => {
                in_cell = false;
                out.push_str("<td");
                out.push_str(alignment_attr(alignments.get(column)));
                out.push('>');
                html::push_html(&mut out, cell.drain(..));
                out.push_str("</td>");
                column += 1;
            }
            other if in_cell => cell.push(other),
            _ => {}
        }
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Drop the header row of tables whose header cells are all blank.
pub fn drop_empty_table_heads(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();

    while let Some(event) = iter.next() {
        let alignments = match event {
            Event::Start(Tag::Table(alignments)) => alignments,
            other => {
                out.push(other);
                continue;
            }
        };

        // Tables do not nest in markdown.
        let mut table = Vec::new();
        for next in iter.by_ref() {
            if matches!(next, Event::End(TagEnd::Table)) {
                break;
            }
            table.push(next);
        }

        if head_has_text(&table) {
            out.push(Event::Start(Tag::Table(alignments)));
            out.extend(table);
            out.push(Event::End(TagEnd::Table));
        } else {
            let rendered = headless_table_html(&alignments, table);
            out.push(Event::Html(CowStr::from(rendered)));
        }
    }
    out
}
