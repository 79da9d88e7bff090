//! Path and URL conversion utilities.
//!
//! This module handles conversions between:
//! - Source file paths (relative paths within the content directory)
//! - Output URLs (relative paths within the destination directory)

use std::path::{Component, Path, PathBuf};

/// Convert a markdown file path to its output URL.
///
/// `index.md` files and pages with `uglyURL` set keep a flat `.html` file;
/// everything else becomes a directory holding an `index.html`.
///
/// # Examples
/// ```ignore
/// page_url(Path::new("about.md"), false) => "about/index.html"
/// page_url(Path::new("about.md"), true) => "about.html"
/// page_url(Path::new("index.md"), false) => "index.html"
/// page_url(Path::new("blog/index.md"), false) => "blog/index.html"
/// ```
pub fn page_url(path: &Path, ugly_url: bool) -> String {
    let path_str = relative_url(path);
    let trimmed = path_str.strip_suffix(".md").unwrap_or(&path_str);

    let is_index = path.file_name().is_some_and(|name| name == "index.md");
    if is_index || ugly_url {
        format!("{trimmed}.html")
    } else {
        format!("{trimmed}/index.html")
    }
}

/// Convert a relative path to a `/`-separated URL string.
pub fn relative_url(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert an output URL to a file path in the output directory.
pub fn url_to_output_path(url: &str, output_dir: &Path) -> PathBuf {
    url.split('/')
        .filter(|part| !part.is_empty())
        .fold(output_dir.to_path_buf(), |path, part| path.join(part))
}

/// Returns true if the path names a markdown source file.
pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}
