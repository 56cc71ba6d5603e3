use chrono::{DateTime, Utc};

use crate::mirror::UNCATEGORIZED_SLUG;
use crate::taxonomy::{Category, PageRef};

/// Render the category tree, in builder order, into one navigable index
/// document. Pure: no filesystem or network access.
pub fn render_index(
    title: &str,
    source_url: &str,
    docs_dir: &str,
    categories: &[Category],
    others: &[PageRef],
    generated_at: &str,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {title}\n\n"));
    out.push_str(&format!(
        "_This repository is a mirror of the [original documentation]({source_url}). \
         It is regenerated from scratch on every run._\n\n"
    ));
    out.push_str(&format!("**Last updated:** {generated_at}\n\n"));
    out.push_str("---\n\n");

    for category in categories {
        out.push_str(&format!("## {}\n\n", category.title));
        for file in &category.files {
            out.push_str(&format!(
                "- [{}](./{}/{}/{}.md)\n",
                file.title, docs_dir, category.slug, file.slug
            ));
        }
        out.push('\n');
    }

    if !others.is_empty() {
        out.push_str("## Others\n\n");
        for file in others {
            out.push_str(&format!(
                "- [{}](./{}/{}/{}.md)\n",
                file.title, docs_dir, UNCATEGORIZED_SLUG, file.slug
            ));
        }
        out.push('\n');
    }

    out
}

/// The current time as a readable UTC date string for the index header.
pub fn now_utc_string() -> String {
    format_utc(Utc::now())
}

fn format_utc(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
