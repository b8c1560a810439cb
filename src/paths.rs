//! Logical content paths.
//!
//! Every path the engine hands to a [`Backend`](crate::backend::Backend) is a
//! `/`-separated string rooted at `/`, independent of the host OS. Requests
//! arrive in arbitrary shapes (`menu1//article1/`, `./menu1`, empty), so they
//! are cleaned once at the boundary and everything downstream can compare
//! paths as plain strings.

/// The content root.
pub const ROOT: &str = "/";

/// Normalize a request path.
///
/// - repeated separators collapse: `/a//b` → `/a/b`
/// - `.` segments vanish and `..` pops a segment, never above the root
/// - trailing separators are dropped: `/a/b/` → `/a/b`
/// - the empty path and `.` both become `/`
pub fn clean(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Parent directory of a cleaned path, `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) | None => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
    }
}

/// Append a single child name to a cleaned directory path.
pub fn join(dir: &str, name: &str) -> String {
    if is_root(dir) {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Whether `path` lies inside the closed prefix of `dir`.
///
/// Matching is per segment: `/a/b` contains `/a/b` and `/a/b/c`, but not
/// `/a/bc`.
pub fn contains(dir: &str, path: &str) -> bool {
    if is_root(dir) || dir == path {
        return true;
    }
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// The chain from `path` up to and including the root, leaf first.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut chain = vec![path];
    let mut current = path;
    while let Some(up) = parent(current) {
        chain.push(up);
        current = up;
    }
    chain
}

/// Final segment of a cleaned path, empty for the root.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}
