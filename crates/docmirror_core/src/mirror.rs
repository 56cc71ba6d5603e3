use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::client::PageFetcher;
use crate::rewrite::{LinkRewriter, LinkWarning, RewriteContext};
use crate::slug::page_slug;
use crate::taxonomy::{PageRef, Taxonomy};

/// Directory slug for pages the navigation never listed.
pub const UNCATEGORIZED_SLUG: &str = "others";

/// A page whose fetch or write failed. Contained at the unit level; the
/// batch result stays usable regardless of how many units fail.
#[derive(Debug)]
pub struct PageFailure {
    pub url: String,
    pub reason: String,
}

/// Aggregate result of one mirror batch.
#[derive(Debug)]
pub struct MirrorOutcome {
    pub pages_written: usize,
    pub failures: Vec<PageFailure>,
    pub warnings: Vec<LinkWarning>,
    /// Pages that fell into the uncategorized bucket, deduplicated by
    /// identifier, in sitemap order. Feeds the "Others" index section.
    pub others: Vec<PageRef>,
}

/// Remove the previous run's output and recreate the output root. Every
/// run is a full rebuild from freshly fetched state.
pub fn clean_output(docs_dir: &Path, index_file: &Path) -> Result<()> {
    if docs_dir.exists() {
        fs::remove_dir_all(docs_dir)
            .with_context(|| format!("failed to remove {}", docs_dir.display()))?;
    }
    if index_file.exists() {
        fs::remove_file(index_file)
            .with_context(|| format!("failed to remove {}", index_file.display()))?;
    }
    fs::create_dir_all(docs_dir)
        .with_context(|| format!("failed to create {}", docs_dir.display()))?;
    Ok(())
}

struct PageJob {
    url: String,
    slug: String,
    category_slug: String,
    dest: PathBuf,
    label: String,
}

/// Fetch, rewrite, and persist every page, in parallel on the global
/// rayon pool.
///
/// Destination paths are a pure function of inputs fixed before the batch
/// starts, so units never write the same file. The category lookup is
/// read-only during the batch; each unit's failure is converted into a
/// [`PageFailure`] instead of aborting the join.
pub fn mirror_pages(
    urls: &[String],
    taxonomy: &Taxonomy,
    fetcher: &dyn PageFetcher,
    docs_dir: &Path,
    docs_prefix: &str,
) -> Result<MirrorOutcome> {
    let rewriter = LinkRewriter::new(docs_prefix)?;

    let mut jobs = Vec::with_capacity(urls.len());
    let mut others = Vec::new();
    let mut seen_others = HashSet::new();
    for url in urls {
        let slug = page_slug(url).to_string();
        if slug.is_empty() {
            continue;
        }
        let category_slug = taxonomy
            .index
            .category_for(&slug)
            .unwrap_or(UNCATEGORIZED_SLUG)
            .to_string();
        if category_slug == UNCATEGORIZED_SLUG && seen_others.insert(slug.clone()) {
            others.push(PageRef {
                slug: slug.clone(),
                title: slug.clone(),
                source_url: url.clone(),
            });
        }

        let dest_dir = docs_dir.join(&category_slug);
        fs::create_dir_all(&dest_dir)
            .with_context(|| format!("failed to create {}", dest_dir.display()))?;
        jobs.push(PageJob {
            url: url.clone(),
            label: format!(
                "{}/{}/{}.md",
                docs_dir.display(),
                category_slug,
                slug
            ),
            dest: dest_dir.join(format!("{slug}.md")),
            slug,
            category_slug,
        });
    }

    let results: Vec<Result<Vec<LinkWarning>, PageFailure>> = jobs
        .par_iter()
        .map(|job| process_page(job, &rewriter, taxonomy, fetcher))
        .collect();

    let mut pages_written = 0;
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for result in results {
        match result {
            Ok(page_warnings) => {
                pages_written += 1;
                warnings.extend(page_warnings);
            }
            Err(failure) => failures.push(failure),
        }
    }

    Ok(MirrorOutcome {
        pages_written,
        failures,
        warnings,
        others,
    })
}

fn process_page(
    job: &PageJob,
    rewriter: &LinkRewriter,
    taxonomy: &Taxonomy,
    fetcher: &dyn PageFetcher,
) -> Result<Vec<LinkWarning>, PageFailure> {
    let fail = |error: anyhow::Error| PageFailure {
        url: job.url.clone(),
        reason: format!("{error:#}"),
    };

    let content = fetcher
        .fetch_text(&format!("{}.md", job.url))
        .map_err(fail)?;
    let outcome = rewriter.rewrite(
        &content,
        &RewriteContext {
            category_slug: &job.category_slug,
            page_slug: &job.slug,
            label: &job.label,
        },
        &taxonomy.index,
    );
    fs::write(&job.dest, outcome.content)
        .with_context(|| format!("failed to write {}", job.dest.display()))
        .map_err(fail)?;
    Ok(outcome.warnings)
}
