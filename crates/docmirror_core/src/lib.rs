//! Mirrors a remote documentation site into a local directory tree,
//! reorganized by the site's own navigation taxonomy, with every intra-site
//! link rewritten to a relative local path.

pub mod client;
pub mod config;
pub mod mirror;
pub mod report;
pub mod rewrite;
pub mod sitemap;
pub mod slug;
pub mod taxonomy;
