//! CLI output formatting.
//!
//! # Outline
//!
//! An outline shows what a request resolves to: the menu levels from the
//! root down, the article list, the index article, and which entry became
//! the content. Active entries carry a `*` marker.
//!
//! ```text
//! Page /menu1/article1 (modified 2024-02-01 10:00)
//!
//! Menu
//! 001 Menu 1 → /menu1 *
//! 002 Menu 2 → /menu2
//!     001 Sub → /menu1/sub
//!
//! Articles
//! 001 First → /menu1/article1 *
//!     Date: 2024-01-01 10:00
//!     Description: Opening post
//! 002 (article2) → /menu1/article2
//!     Date: 2024-02-01 10:00
//!
//! Index
//!     Welcome → /menu1/welcome
//!
//! Content
//!     First → /menu1/article1
//!     Next: /menu1/article2
//! ```
//!
//! # Check
//!
//! ```text
//! Checked 12 entries (8 articles)
//!
//! Issues
//!     /blog/broken: malformed metadata in "/blog/broken/meta.json": ...
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::entry::Entry;
use crate::page::Page;
use crate::paths;
use crate::site::CheckReport;

const DESC_WIDTH: usize = 60;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Entries without a title show their directory name in parens.
fn display_title(entry: &Entry) -> String {
    match entry.title() {
        "" => format!("({})", paths::file_name(entry.link())),
        title => title.to_string(),
    }
}

/// ```text
/// 001 First → /menu1/article1 *
/// ```
fn entry_line(position: usize, entry: &Entry, depth: usize) -> String {
    let marker = if entry.is_active() { " *" } else { "" };
    format!(
        "{}{} {} → {}{}",
        indent(depth),
        format_index(position),
        display_title(entry),
        entry.link(),
        marker
    )
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ============================================================================
// Outline
// ============================================================================

pub fn format_outline(page: &Page) -> Vec<String> {
    let mut lines = Vec::new();

    match page.mod_time() {
        Some(ts) => lines.push(format!("Page {} (modified {})", page.path(), ts)),
        None => lines.push(format!("Page {}", page.path())),
    }

    if !page.menu().is_empty() {
        lines.push(String::new());
        lines.push("Menu".to_string());
        for (depth, level) in page.menu().iter().enumerate() {
            for (i, entry) in level.iter().enumerate() {
                lines.push(entry_line(i + 1, entry, depth));
            }
        }
    }

    if !page.articles().is_empty() {
        lines.push(String::new());
        lines.push("Articles".to_string());
        for (i, article) in page.articles().iter().enumerate() {
            lines.push(entry_line(i + 1, article, 0));
            lines.push(format!("{}Date: {}", indent(1), article.date()));
            if !article.description().is_empty() {
                lines.push(format!(
                    "{}Description: {}",
                    indent(1),
                    truncate_desc(article.description(), DESC_WIDTH)
                ));
            }
            if article.is_hidden() {
                lines.push(format!("{}Hidden", indent(1)));
            }
        }
    }

    if let Some(index) = page.index() {
        lines.push(String::new());
        lines.push("Index".to_string());
        lines.push(format!(
            "{}{} → {}",
            indent(1),
            display_title(index),
            index.link()
        ));
    }

    lines.push(String::new());
    lines.push("Content".to_string());
    match page.content() {
        Some(content) => {
            lines.push(format!(
                "{}{} → {}",
                indent(1),
                display_title(content),
                content.link()
            ));
            if let Some(pos) = page.content_position() {
                if let Some(prev) = page.prev(pos) {
                    lines.push(format!("{}Prev: {}", indent(1), prev.link()));
                }
                if let Some(next) = page.next(pos) {
                    lines.push(format!("{}Next: {}", indent(1), next.link()));
                }
            }
        }
        None => lines.push(format!("{}(none)", indent(1))),
    }

    lines
}

pub fn print_outline(page: &Page) {
    for line in format_outline(page) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {} entries ({} articles)",
        report.entries, report.articles
    )];
    if !report.issues.is_empty() {
        lines.push(String::new());
        lines.push("Issues".to_string());
        for issue in &report.issues {
            lines.push(format!("{}{}: {}", indent(1), issue.path, issue.message));
        }
    }
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}
