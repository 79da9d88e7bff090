use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::{Context, Tera, Value};
use tracing::debug;
use walkdir::WalkDir;

use super::paths::relative_url;
use super::section::{Pages, SectionForPage};

/// Suffix every layout template carries.
pub const TEMPLATE_SUFFIX: &str = ".html.tmpl";

/// Layout subdirectory copied verbatim into the output.
pub const STATIC_DIR: &str = "static";

#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("{} is not a directory", .0.display())]
    StaticNotADirectory(PathBuf),

    #[error("failed to walk layout directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compiled layout templates plus the optional static asset directory.
pub struct Layout {
    tera: Tera,
    static_dir: Option<PathBuf>,
}

impl Layout {
    /// Load every `.html.tmpl` file under `layout_dir`, keyed by its relative path.
    ///
    /// The top-level `static/` directory is not scanned for templates. Templates
    /// are compiled here, so syntax errors surface before anything is rendered.
    pub fn load(layout_dir: &Path) -> Result<Self, LayoutError> {
        let mut templates = Vec::new();

        let walker = WalkDir::new(layout_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == STATIC_DIR));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel_path = entry
                .path()
                .strip_prefix(layout_dir)
                .unwrap_or(entry.path());
            let name = relative_url(rel_path);
            if !name.ends_with(TEMPLATE_SUFFIX) {
                continue;
            }

            debug!(template = %name, "loading template");
            let source = std::fs::read_to_string(entry.path())?;
            templates.push((name, source));
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("by_title", by_title);
        tera.register_filter("by_created_at", by_created_at);
        tera.add_raw_templates(templates)?;

        let static_dir = find_static_dir(layout_dir)?;

        Ok(Self { tera, static_dir })
    }

    /// Look up the template a content file names in its front matter.
    pub fn template_for_content<'a>(&'a self, name: &'a str) -> Result<Template<'a>, LayoutError> {
        if self.tera.get_template_names().any(|n| n == name) {
            Ok(Template {
                tera: &self.tera,
                name,
            })
        } else {
            Err(LayoutError::TemplateNotFound(name.to_string()))
        }
    }

    /// The layout's `static/` directory, if it has one.
    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }
}

fn find_static_dir(layout_dir: &Path) -> Result<Option<PathBuf>, LayoutError> {
    let static_dir = layout_dir.join(STATIC_DIR);
    match std::fs::metadata(&static_dir) {
        Ok(meta) if meta.is_dir() => Ok(Some(static_dir)),
        Ok(_) => Err(LayoutError::StaticNotADirectory(static_dir)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A resolved template, ready to render pages.
pub struct Template<'a> {
    tera: &'a Tera,
    name: &'a str,
}

impl Template<'_> {
    pub fn render(&self, view: &SectionForPage<'_>) -> Result<String, LayoutError> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(self.name, &context)?)
    }
}

// =============================================================================
// Template filters
// =============================================================================

/// `{{ others | by_title }}`
fn by_title(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let mut pages: Pages = tera::from_value(value.clone())?;
    pages.by_title();
    Ok(tera::to_value(pages)?)
}

/// `{{ others | by_created_at }}`
fn by_created_at(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let mut pages: Pages = tera::from_value(value.clone())?;
    pages.by_created_at();
    Ok(tera::to_value(pages)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::build::section::{Page, StaticFile};

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn page(source: &str, title: &str, created_at: &str) -> Page {
        Page {
            url: source.replace(".md", "/index.html"),
            source: source.to_string(),
            title: title.to_string(),
            created_at: created_at.parse().unwrap(),
            updated_at: None,
            content: format!("<p>{title}</p>\n"),
            template: "page.html.tmpl".to_string(),
            ugly_url: false,
        }
    }

    #[test]
    fn test_load_templates_by_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html.tmpl", "index");
        write(dir.path(), "blog/post.html.tmpl", "post");
        write(dir.path(), "README.md", "not a template");

        let layout = Layout::load(dir.path()).unwrap();

        assert!(layout.template_for_content("index.html.tmpl").is_ok());
        assert!(layout.template_for_content("blog/post.html.tmpl").is_ok());
        assert!(matches!(
            layout.template_for_content("README.md"),
            Err(LayoutError::TemplateNotFound(_))
        ));
        assert!(layout.static_dir().is_none());
    }

    #[test]
    fn test_template_lookup_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blog/post.html.tmpl", "post");

        let layout = Layout::load(dir.path()).unwrap();

        assert!(matches!(
            layout.template_for_content("post.html.tmpl"),
            Err(LayoutError::TemplateNotFound(name)) if name == "post.html.tmpl"
        ));
    }

    #[test]
    fn test_static_dir_is_not_scanned() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "page.html.tmpl", "page");
        write(dir.path(), "static/broken.html.tmpl", "{% if %}");

        let layout = Layout::load(dir.path()).unwrap();

        assert!(layout.template_for_content("static/broken.html.tmpl").is_err());
        assert_eq!(layout.static_dir(), Some(dir.path().join("static").as_path()));
    }

    #[test]
    fn test_static_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "page.html.tmpl", "page");
        write(dir.path(), "static", "not a directory");

        let result = Layout::load(dir.path());
        assert!(matches!(result, Err(LayoutError::StaticNotADirectory(_))));
    }

    #[test]
    fn test_syntax_error_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "page.html.tmpl", "{{ current.title ");

        let result = Layout::load(dir.path());
        assert!(matches!(result, Err(LayoutError::Template(_))));
    }

    #[test]
    fn test_missing_layout_dir() {
        let dir = tempfile::tempdir().unwrap();

        let result = Layout::load(&dir.path().join("missing"));
        assert!(matches!(result, Err(LayoutError::Walk(_))));
    }

    #[test]
    fn test_render_is_not_escaped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "page.html.tmpl",
            "<title>{{ current.title }}</title>{{ current.content }}",
        );
        let layout = Layout::load(dir.path()).unwrap();
        let current = page("a.md", "A & B", "2025-01-01T00:00:00Z");

        let html = layout
            .template_for_content("page.html.tmpl")
            .unwrap()
            .render(&SectionForPage {
                current: &current,
                others: Pages::default(),
                files: &[],
            })
            .unwrap();

        assert_eq!(html, "<title>A & B</title><p>A & B</p>\n");
    }

    #[test]
    fn test_sort_filters() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "list.html.tmpl",
            "{% for p in others | by_title %}{{ p.title }};{% endfor %}\
             |{% for p in others | by_created_at | reverse %}{{ p.title }};{% endfor %}\
             |{% for f in files %}{{ f.url }};{% endfor %}",
        );
        let layout = Layout::load(dir.path()).unwrap();

        let current = page("index.md", "Index", "2025-01-01T00:00:00Z");
        let others = Pages::from(vec![
            page("b.md", "Bravo", "2025-01-01T00:00:00Z"),
            page("c.md", "Charlie", "2025-03-01T00:00:00Z"),
            page("a.md", "Alpha", "2025-02-01T00:00:00Z"),
        ]);
        let files = vec![StaticFile {
            url: "logo.png".to_string(),
        }];

        let html = layout
            .template_for_content("list.html.tmpl")
            .unwrap()
            .render(&SectionForPage {
                current: &current,
                others,
                files: &files,
            })
            .unwrap();

        assert_eq!(html, "Alpha;Bravo;Charlie;|Charlie;Alpha;Bravo;|logo.png;");
    }
}
