/// Canonical page identifier: the final path segment of a URL or path,
/// with any `#fragment` or `?query` suffix removed first.
///
/// Total function: malformed or empty input yields an empty slug and the
/// caller decides what to do with it.
pub fn page_slug(path: &str) -> &str {
    let end = path.find(['#', '?']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or("")
}

/// Derive a filesystem-safe directory slug from a category title:
/// lowercase, each whitespace run becomes a single hyphen, every other
/// character outside `[a-z0-9-]` is dropped.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_whitespace() {
            pending_hyphen = true;
            continue;
        }
        if pending_hyphen {
            out.push('-');
            pending_hyphen = false;
        }
        if ch.is_ascii_alphanumeric() || ch == '-' {
            out.push(ch);
        }
    }
    out
}
