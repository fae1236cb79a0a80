//! Template file enumeration.
//!
//! Walks the template root and yields every file whose extension matches the
//! filter, in a stable (sorted) order, together with its entry name.

use jwalk::WalkDir;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// A template source on disk and the name it is addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Root-relative path with `/` separators, e.g. `partials/header.tmpl`.
    pub name: String,
}

/// Collect all files under `root` whose extension matches `extension`.
///
/// Any traversal error aborts the enumeration: an artifact compiled from a
/// partial file set would silently drop templates.
pub fn collect_files(root: &Path, extension: &str) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort(true).skip_hidden(false) {
        let entry = entry.map_err(|e| Error::Scan(root.to_path_buf(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !matches_extension(&path, extension) {
            continue;
        }

        crate::debug!("scan"; "found {}", path.display());
        files.push(SourceFile {
            name: entry_name(root, &path),
            path,
        });
    }

    Ok(files)
}

/// Exact extension match. A leading dot in the filter is ignored and an empty
/// filter matches files without an extension.
pub fn matches_extension(path: &Path, extension: &str) -> bool {
    let extension = normalize_extension(extension);
    match path.extension() {
        Some(ext) => !extension.is_empty() && ext == extension,
        None => extension.is_empty(),
    }
}

/// Strip the optional leading dot from an extension filter.
pub fn normalize_extension(extension: &str) -> &str {
    extension.strip_prefix('.').unwrap_or(extension)
}

/// Derive the entry name of `path`: its root-relative path joined with `/`.
pub fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
