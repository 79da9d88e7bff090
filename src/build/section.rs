//! Grouping of content files into per-directory sections.
//!
//! Every markdown file becomes a [`Page`]; every other file becomes a
//! [`StaticFile`] copied as-is. Pages are rendered with a [`SectionForPage`]
//! view so templates can list their sibling pages and files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::document::{ContentError, ParsedContent};
use super::paths::{is_markdown, page_url, relative_url};

#[derive(thiserror::Error, Debug)]
pub enum SectionError {
    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Content {
        path: PathBuf,
        source: ContentError,
    },
}

/// A rendered markdown page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Output path relative to the build directory
    pub url: String,
    /// Source path relative to the content directory
    pub source: String,
    pub title: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// Rendered HTML body
    pub content: String,
    pub template: String,
    pub ugly_url: bool,
}

impl Page {
    fn new(source: &Path, parsed: ParsedContent) -> Self {
        let ParsedContent { front_matter, html } = parsed;
        Self {
            url: page_url(source, front_matter.ugly_url),
            source: relative_url(source),
            title: front_matter.title,
            created_at: front_matter.created_at,
            updated_at: front_matter.updated_at,
            content: html,
            template: front_matter.template,
            ugly_url: front_matter.ugly_url,
        }
    }
}

/// An ordered list of pages with chainable sorting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pages(Vec<Page>);

impl Pages {
    /// Sort by title, ascending. Equal titles keep their order.
    pub fn by_title(&mut self) -> &mut Self {
        self.0.sort_by(|a, b| a.title.cmp(&b.title));
        self
    }

    /// Sort by creation time, oldest first. Equal times keep their order.
    pub fn by_created_at(&mut self) -> &mut Self {
        self.0.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self
    }

    pub fn reverse(&mut self) -> &mut Self {
        self.0.reverse();
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.0.iter()
    }
}

impl From<Vec<Page>> for Pages {
    fn from(pages: Vec<Page>) -> Self {
        Self(pages)
    }
}

impl<'a> IntoIterator for &'a Pages {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A non-markdown content file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticFile {
    /// Path relative to the content directory, `/`-separated
    pub url: String,
}

/// All pages and files sharing one content directory.
#[derive(Debug, Default)]
pub struct Section {
    pub pages: Pages,
    pub files: Vec<StaticFile>,
}

impl Section {
    /// The view a template sees while rendering `page`.
    pub fn for_page<'a>(&'a self, page: &'a Page) -> SectionForPage<'a> {
        let others = self
            .pages
            .iter()
            .filter(|other| other.source != page.source)
            .cloned()
            .collect::<Vec<_>>();

        SectionForPage {
            current: page,
            others: Pages(others),
            files: &self.files,
        }
    }
}

/// Template context for a single page.
#[derive(Debug, Serialize)]
pub struct SectionForPage<'a> {
    pub current: &'a Page,
    pub others: Pages,
    pub files: &'a [StaticFile],
}

/// Every section of the content tree, plus the order its pages were walked in.
#[derive(Debug, Default)]
pub struct Content {
    pub sections: Vec<Section>,
    /// `(section, page)` indices in walk order
    walk_order: Vec<(usize, usize)>,
}

impl Content {
    /// Pages in walk order, each paired with its section.
    ///
    /// Writing pages in this order makes the later of two pages with the same
    /// URL win.
    pub fn pages(&self) -> impl Iterator<Item = (&Section, &Page)> {
        self.walk_order.iter().map(|&(section, page)| {
            let section = &self.sections[section];
            (section, &section.pages.0[page])
        })
    }
}

/// Walk `content_dir` and group its files by directory.
///
/// Files are visited in file-name order and sections keep the order their
/// directory was first seen. Any content error aborts the walk.
pub fn collect_sections<F>(content_dir: &Path, parse: F) -> Result<Content, SectionError>
where
    F: Fn(&str) -> Result<ParsedContent, ContentError>,
{
    let mut sections: Vec<Section> = Vec::new();
    let mut walk_order = Vec::new();
    let mut section_index: HashMap<PathBuf, usize> = HashMap::new();
    let mut written: HashMap<String, String> = HashMap::new();

    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(content_dir)
            .unwrap_or(entry.path());
        let dir = rel_path.parent().map(Path::to_path_buf).unwrap_or_default();

        let index = *section_index.entry(dir).or_insert_with(|| {
            sections.push(Section::default());
            sections.len() - 1
        });
        let section = &mut sections[index];

        if !is_markdown(rel_path) {
            debug!(file = %rel_path.display(), "found static file");
            section.files.push(StaticFile {
                url: relative_url(rel_path),
            });
            continue;
        }

        debug!(file = %rel_path.display(), "processing page");
        let source = std::fs::read_to_string(entry.path()).map_err(|source| SectionError::Read {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let parsed = parse(&source).map_err(|source| SectionError::Content {
            path: entry.path().to_path_buf(),
            source,
        })?;

        let page = Page::new(rel_path, parsed);
        if let Some(previous) = written.insert(page.url.clone(), page.source.clone()) {
            warn!(
                url = %page.url,
                "{previous} and {} write the same file, the later one wins",
                page.source
            );
        }
        walk_order.push((index, section.pages.0.len()));
        section.pages.0.push(page);
    }

    Ok(Content {
        sections,
        walk_order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::build::document::{parse, tests::to_content};
    use crate::config::MarkdownConfig;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn write_page(root: &Path, rel: &str, title: &str, created_at: &str, ugly_url: bool) {
        let content = to_content(
            serde_json::json!({
                "title": title,
                "createdAt": created_at,
                "template": "page.html.tmpl",
                "uglyURL": ugly_url,
            }),
            &format!("# {title}"),
        );
        write(root, rel, &content);
    }

    fn collect(root: &Path) -> Result<Vec<Section>, SectionError> {
        collect_content(root).map(|content| content.sections)
    }

    fn collect_content(root: &Path) -> Result<Content, SectionError> {
        let config = MarkdownConfig::default();
        collect_sections(root, |source| parse(source, &config))
    }

    fn urls(section: &Section) -> Vec<&str> {
        section.pages.iter().map(|p| p.url.as_str()).collect()
    }

    fn titles(pages: &Pages) -> Vec<&str> {
        pages.iter().map(|p| p.title.as_str()).collect()
    }

    fn page(title: &str, created_at: &str) -> Page {
        Page {
            url: format!("{title}/index.html"),
            source: format!("{title}.md"),
            title: title.to_string(),
            created_at: created_at.parse().unwrap(),
            updated_at: None,
            content: String::new(),
            template: "page.html.tmpl".to_string(),
            ugly_url: false,
        }
    }

    #[test]
    fn test_single_section() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "index.md", "Home", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "about.md", "About", "2025-01-02T00:00:00Z", false);
        write_page(dir.path(), "contact.md", "Contact", "2025-01-03T00:00:00Z", true);
        write(dir.path(), "logo.png", "png");

        let sections = collect(dir.path()).unwrap();

        assert_eq!(sections.len(), 1);
        assert_eq!(
            urls(&sections[0]),
            vec!["about/index.html", "contact.html", "index.html"]
        );
        assert_eq!(
            sections[0].files,
            vec![StaticFile {
                url: "logo.png".to_string()
            }]
        );

        let about = &sections[0].pages.0[0];
        assert_eq!(about.source, "about.md");
        assert_eq!(about.content, "<h1>About</h1>\n");
        assert_eq!(about.template, "page.html.tmpl");
    }

    #[test]
    fn test_sections_by_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "index.md", "Home", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "blog/index.md", "Blog", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "blog/post1.md", "Post 1", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "blog/post2.md", "Post 2", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "blog/post3/index.md", "Post 3", "2025-01-01T00:00:00Z", false);
        write(dir.path(), "blog/post3/photo.jpg", "jpg");

        let sections = collect(dir.path()).unwrap();

        assert_eq!(sections.len(), 3);
        assert_eq!(
            urls(&sections[0]),
            vec!["blog/index.html", "blog/post1/index.html", "blog/post2/index.html"]
        );
        assert_eq!(urls(&sections[1]), vec!["blog/post3/index.html"]);
        assert_eq!(sections[1].files[0].url, "blog/post3/photo.jpg");
        assert_eq!(urls(&sections[2]), vec!["index.html"]);
    }

    #[test]
    fn test_content_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "good.md", "Good", "2025-01-01T00:00:00Z", false);
        write(dir.path(), "bad.md", "# no front matter");

        let err = collect(dir.path()).unwrap_err();

        match err {
            SectionError::Content { path, source } => {
                assert_eq!(path, dir.path().join("bad.md"));
                assert!(matches!(source, ContentError::NoFrontMatter));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_url_keeps_both_in_walk_order() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.md", "A", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "page.md", "Flat", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "page/index.md", "Nested", "2025-01-01T00:00:00Z", false);

        let content = collect_content(dir.path()).unwrap();

        // The root section is seen first, but `page/` is walked before `page.md`.
        assert_eq!(urls(&content.sections[0]), vec!["a/index.html", "page/index.html"]);
        let walked: Vec<&str> = content
            .pages()
            .map(|(_, page)| page.source.as_str())
            .collect();
        assert_eq!(walked, vec!["a.md", "page/index.md", "page.md"]);
    }

    #[test]
    fn test_pages_come_with_their_section() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "index.md", "Home", "2025-01-01T00:00:00Z", false);
        write_page(dir.path(), "blog/post.md", "Post", "2025-01-01T00:00:00Z", false);
        write(dir.path(), "blog/photo.jpg", "jpg");

        let content = collect_content(dir.path()).unwrap();

        for (section, page) in content.pages() {
            assert!(section.pages.iter().any(|p| p.source == page.source));
        }
        let (blog, post) = content.pages().next().unwrap();
        assert_eq!(post.source, "blog/post.md");
        assert_eq!(blog.files[0].url, "blog/photo.jpg");
    }

    #[test]
    fn test_missing_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = collect(&dir.path().join("missing"));
        assert!(matches!(result, Err(SectionError::Walk(_))));
    }

    #[test]
    fn test_for_page_excludes_current() {
        let section = Section {
            pages: Pages::from(vec![
                page("a", "2025-01-01T00:00:00Z"),
                page("b", "2025-01-02T00:00:00Z"),
                page("c", "2025-01-03T00:00:00Z"),
            ]),
            files: vec![StaticFile {
                url: "logo.png".to_string(),
            }],
        };

        let view = section.for_page(&section.pages.0[1]);

        assert_eq!(view.current.title, "b");
        assert_eq!(titles(&view.others), vec!["a", "c"]);
        assert_eq!(view.files.len(), 1);
    }

    #[test]
    fn test_sorting_is_chainable() {
        let mut pages = Pages::from(vec![
            page("b", "2025-01-03T00:00:00Z"),
            page("c", "2025-01-01T00:00:00Z"),
            page("a", "2025-01-02T00:00:00Z"),
        ]);

        assert_eq!(titles(pages.by_title()), vec!["a", "b", "c"]);
        assert_eq!(titles(pages.by_title().reverse()), vec!["c", "b", "a"]);
        assert_eq!(titles(pages.by_created_at()), vec!["c", "a", "b"]);
        assert_eq!(titles(pages.by_created_at().reverse()), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sorting_is_stable() {
        let mut first = page("same", "2025-01-01T00:00:00Z");
        first.source = "first.md".to_string();
        let mut second = page("same", "2025-01-01T00:00:00Z");
        second.source = "second.md".to_string();
        let mut pages = Pages::from(vec![first, second]);

        let sources: Vec<String> = pages.by_title().iter().map(|p| p.source.clone()).collect();
        assert_eq!(sources, vec!["first.md", "second.md"]);

        let sources: Vec<String> = pages
            .by_created_at()
            .iter()
            .map(|p| p.source.clone())
            .collect();
        assert_eq!(sources, vec!["first.md", "second.md"]);
    }
}
