use std::fmt;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use crate::slug::page_slug;
use crate::taxonomy::CategoryIndex;

/// Identity of the document being rewritten.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Slug of the category directory the document is written into.
    pub category_slug: &'a str,
    /// The document's own identifier, used to resolve prefix-only targets.
    pub page_slug: &'a str,
    /// Human-readable location for diagnostics, e.g. `docs/guides/quickstart.md`.
    pub label: &'a str,
}

/// A link whose target identifier is absent from the lookup. The original
/// link text is left untouched; the warning lets the operator audit the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkWarning {
    pub target_slug: String,
    pub label: String,
}

impl fmt::Display for LinkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved link target '{}' in {}",
            self.target_slug, self.label
        )
    }
}

#[derive(Debug)]
pub struct RewriteOutcome {
    pub content: String,
    pub warnings: Vec<LinkWarning>,
}

/// Rewrites absolute intra-site Markdown links into relative local paths.
///
/// Matches only Markdown destinations of the form `](<prefix><path>#frag)`.
/// Everything else in the document, including code blocks and link text,
/// passes through untouched. Rewritten destinations are relative, so a
/// second pass over the output is a no-op.
pub struct LinkRewriter {
    pattern: Regex,
}

impl LinkRewriter {
    /// Compile the matcher for one documentation path prefix.
    pub fn new(docs_prefix: &str) -> Result<Self> {
        // The path group excludes `#`, `)` and `"` so the fragment group
        // captures `#...` verbatim and the match stops at the closing paren.
        let pattern = format!(
            r##"\]\({}([^"#)]*)(#[^")]*)?\)"##,
            regex::escape(docs_prefix)
        );
        let pattern = Regex::new(&pattern)
            .with_context(|| format!("failed to compile link pattern for prefix {docs_prefix}"))?;
        Ok(Self { pattern })
    }

    /// Rewrite every qualifying link in `content`. Unresolved targets are
    /// returned byte-for-byte unchanged, one warning per occurrence.
    pub fn rewrite(
        &self,
        content: &str,
        ctx: &RewriteContext<'_>,
        index: &CategoryIndex,
    ) -> RewriteOutcome {
        let mut warnings = Vec::new();
        let content = self.pattern.replace_all(content, |caps: &Captures<'_>| {
            let raw_path = caps.get(1).map_or("", |m| m.as_str());
            let fragment = caps.get(2).map_or("", |m| m.as_str());

            // A prefix-only destination points at the document itself.
            let mut target = page_slug(raw_path);
            if target.is_empty() {
                target = ctx.page_slug;
            }

            match index.category_for(target) {
                Some(target_category) => {
                    let relative = relative_path(
                        ctx.category_slug,
                        &format!("{target_category}/{target}.md"),
                    );
                    format!("]({relative}{fragment})")
                }
                None => {
                    warnings.push(LinkWarning {
                        target_slug: target.to_string(),
                        label: ctx.label.to_string(),
                    });
                    caps.get(0).map_or_else(String::new, |m| m.as_str().to_string())
                }
            }
        });
        RewriteOutcome {
            content: content.into_owned(),
            warnings,
        }
    }
}

/// Shortest relative path from the directory `from_dir` to the file
/// `to_file`, both given relative to the same root: walk up past the
/// non-shared components of `from_dir`, then down to the target. Always
/// `/`-separated, as required inside Markdown destinations.
pub fn relative_path(from_dir: &str, to_file: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to_file.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::with_capacity(from.len() - common + to.len() - common);
    parts.resize(from.len() - common, "..");
    parts.extend(&to[common..]);
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::{LinkRewriter, RewriteContext, relative_path};
    use crate::taxonomy::CategoryIndex;

    const PREFIX: &str = "/en/docs/claude-code/";

    fn sample_index() -> CategoryIndex {
        let mut index = CategoryIndex::default();
        index.insert("install", "build");
        index.insert("quickstart", "guides");
        index.insert("hooks", "guides");
        index
    }

    fn guides_ctx<'a>() -> RewriteContext<'a> {
        RewriteContext {
            category_slug: "guides",
            page_slug: "quickstart",
            label: "docs/guides/quickstart.md",
        }
    }

    #[test]
    fn cross_category_link_walks_up_and_down() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let outcome = rewriter.rewrite(
            "See [install](/en/docs/claude-code/install).",
            &guides_ctx(),
            &sample_index(),
        );
        assert_eq!(outcome.content, "See [install](../build/install.md).");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn same_category_link_has_no_ascent() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let outcome = rewriter.rewrite(
            "[hooks](/en/docs/claude-code/hooks)",
            &guides_ctx(),
            &sample_index(),
        );
        assert_eq!(outcome.content, "[hooks](hooks.md)");
    }

    #[test]
    fn fragment_is_preserved_verbatim() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let outcome = rewriter.rewrite(
            "[s](/en/docs/claude-code/install#setup-steps)",
            &guides_ctx(),
            &sample_index(),
        );
        assert_eq!(outcome.content, "[s](../build/install.md#setup-steps)");
    }

    #[test]
    fn link_without_fragment_gains_no_stray_hash() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let outcome = rewriter.rewrite(
            "[i](/en/docs/claude-code/install)",
            &guides_ctx(),
            &sample_index(),
        );
        assert!(!outcome.content.contains('#'));
    }

    #[test]
    fn unresolved_target_is_byte_identical_with_one_warning_per_occurrence() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let text = "[u](/en/docs/claude-code/unknown-page#usage) and \
                    [u](/en/docs/claude-code/unknown-page#usage)";
        let outcome = rewriter.rewrite(text, &guides_ctx(), &sample_index());
        assert_eq!(outcome.content, text);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.warnings[0].target_slug, "unknown-page");
        assert_eq!(outcome.warnings[0].label, "docs/guides/quickstart.md");
        assert!(
            outcome.warnings[0]
                .to_string()
                .contains("unknown-page")
        );
    }

    #[test]
    fn prefix_only_target_resolves_to_the_document_itself() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let outcome = rewriter.rewrite(
            "[top](/en/docs/claude-code/#top)",
            &guides_ctx(),
            &sample_index(),
        );
        assert_eq!(outcome.content, "[top](quickstart.md#top)");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn non_matching_content_passes_through() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let text = "plain text, [other](/en/api/messages), `](/en/docs/claude-code/install` \
                    without closing paren, ![img](/assets/x.png)";
        let outcome = rewriter.rewrite(text, &guides_ctx(), &sample_index());
        assert_eq!(outcome.content, text);
    }

    #[test]
    fn second_pass_over_resolvable_output_is_a_no_op() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let index = sample_index();
        let first = rewriter.rewrite(
            "[a](/en/docs/claude-code/install#x) [b](/en/docs/claude-code/hooks)",
            &guides_ctx(),
            &index,
        );
        let second = rewriter.rewrite(&first.content, &guides_ctx(), &index);
        assert_eq!(second.content, first.content);
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn two_sources_resolve_the_same_target_to_different_paths() {
        let rewriter = LinkRewriter::new(PREFIX).expect("rewriter");
        let index = sample_index();
        let from_build = RewriteContext {
            category_slug: "build",
            page_slug: "install",
            label: "docs/build/install.md",
        };
        let a = rewriter.rewrite("[h](/en/docs/claude-code/hooks)", &guides_ctx(), &index);
        let b = rewriter.rewrite("[h](/en/docs/claude-code/hooks)", &from_build, &index);
        assert_eq!(a.content, "[h](hooks.md)");
        assert_eq!(b.content, "[h](../guides/hooks.md)");
    }

    #[test]
    fn relative_path_between_directories() {
        assert_eq!(relative_path("guides", "build/install.md"), "../build/install.md");
        assert_eq!(relative_path("guides", "guides/hooks.md"), "hooks.md");
        assert_eq!(relative_path("", "build/install.md"), "build/install.md");
        assert_eq!(
            relative_path("a/b/c", "a/x/y.md"),
            "../../x/y.md"
        );
    }
}
