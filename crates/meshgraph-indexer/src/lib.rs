//! Page parsing and directory scanning

pub mod documents;
pub mod parser;
pub mod scan;


pub use documents::{DocumentFilter, page_name_for};
pub use parser::{ParsedPage, extract_wiki_links, parse_frontmatter, parse_page, strip_frontmatter};
pub use scan::{LoadError, ScanReport, find_pages_named, load_page, scan_directory, scan_tree};
