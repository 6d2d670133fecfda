//! XML sitemaps and the sinks they are written to.

pub mod builder;
pub mod sink;

pub use builder::{
    render_index, render_urlset, sitemap_file, sitemap_locs, SitemapBuilder, SitemapEntry,
    SitemapFile, SitemapUpdate, INDEX_FILE, ROBOTS_FILE,
};
pub use sink::{FileSitemapSink, MemorySitemapSink, SitemapSink};
