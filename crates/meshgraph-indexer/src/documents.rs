//! Which files count as pages, and what they are called

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path};

/// Decides whether a path under the root is a page file.
///
/// A page has one of the configured extensions, no hidden path component,
/// and does not match any ignore glob (globs match the root-relative path).
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    extensions: Vec<String>,
    ignore: GlobSet,
}

impl DocumentFilter {
    pub fn new<S: AsRef<str>>(
        extensions: &[S],
        ignore_patterns: &[S],
    ) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore_patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(DocumentFilter {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            ignore: builder.build()?,
        })
    }

    /// `path` may be absolute (under `root`) or already relative.
    pub fn is_document(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);

        let has_extension = relative
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            });
        if !has_extension {
            return false;
        }

        !self.is_hidden(root, path) && !self.ignore.is_match(relative)
    }

    /// True if any component of `path` below `root` starts with a dot.
    pub fn is_hidden(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        relative.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    }
}

impl Default for DocumentFilter {
    /// Markdown files, nothing ignored beyond hidden paths.
    fn default() -> Self {
        DocumentFilter {
            extensions: vec!["md".to_string()],
            ignore: GlobSet::empty(),
        }
    }
}

/// Page name for a file: its stem (`Home Page.md` -> `Home Page`).
pub fn page_name_for(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}
