use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::slug::{page_slug, slugify};

/// One page as listed by the site navigation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageRef {
    pub slug: String,
    pub title: String,
    pub source_url: String,
}

/// A navigation group and its pages, in document order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Category {
    pub title: String,
    pub slug: String,
    pub files: Vec<PageRef>,
}

/// Flat page-identifier to category-slug lookup. Built once by
/// [`parse_navigation`], read-only afterwards; the mirror batch shares it
/// by reference across threads without synchronization.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    entries: HashMap<String, String>,
}

impl CategoryIndex {
    pub fn insert(&mut self, page_slug: impl Into<String>, category_slug: impl Into<String>) {
        self.entries.insert(page_slug.into(), category_slug.into());
    }

    pub fn category_for(&self, page_slug: &str) -> Option<&str> {
        self.entries.get(page_slug).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The category tree plus the flat lookup, both from one navigation scrape.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub categories: Vec<Category>,
    pub index: CategoryIndex,
}

static GROUP_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<h5[^>]*id="sidebar-title"[^>]*>(.*?)</h5>"#).unwrap()
});

static GROUP_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ul[^>]*id="sidebar-group"[^>]*>(.*?)</ul>"#).unwrap()
});

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<a[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#).unwrap());

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Build the taxonomy from the raw markup of the navigation index page.
///
/// Each `sidebar-title` heading opens a group whose link entries are the
/// anchors inside the `sidebar-group` lists between it and the next
/// heading. The navigation page is a full docs page, so anchors outside
/// those lists (page body, footer, breadcrumbs) are never entries. Groups
/// with an empty title are skipped; groups with zero entries are retained.
/// Document order is preserved for both categories and files, and governs
/// the generated index. When two groups list the same identifier the later
/// listing wins in the lookup.
pub fn parse_navigation(markup: &str, base_url: &str) -> Taxonomy {
    let mut headings = Vec::new();
    for caps in GROUP_TITLE_RE.captures_iter(markup) {
        let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        headings.push((visible_text(title.as_str()), whole.start(), whole.end()));
    }

    let mut taxonomy = Taxonomy::default();
    for (position, (title, _, body_start)) in headings.iter().enumerate() {
        if title.is_empty() {
            continue;
        }
        let body_end = headings
            .get(position + 1)
            .map_or(markup.len(), |(_, next_start, _)| *next_start);
        let category_slug = slugify(title);
        let mut files = Vec::new();

        for list in GROUP_LIST_RE.captures_iter(&markup[*body_start..body_end]) {
            let Some(list_body) = list.get(1) else {
                continue;
            };
            for caps in ANCHOR_RE.captures_iter(list_body.as_str()) {
                let (Some(href), Some(label)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                let href = href.as_str();
                if !href.starts_with('/') {
                    continue;
                }
                let file_slug = page_slug(href);
                if file_slug.is_empty() {
                    continue;
                }
                taxonomy.index.insert(file_slug, category_slug.clone());
                files.push(PageRef {
                    slug: file_slug.to_string(),
                    title: visible_text(label.as_str()),
                    source_url: format!("{base_url}{href}"),
                });
            }
        }

        taxonomy.categories.push(Category {
            title: title.clone(),
            slug: category_slug,
            files,
        });
    }
    taxonomy
}

/// Strip inner tags from a markup snippet and collapse whitespace runs.
fn visible_text(markup: &str) -> String {
    let stripped = TAG_RE.replace_all(markup, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
