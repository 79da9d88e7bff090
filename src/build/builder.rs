use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{MarkdownConfig, ProjectConfig};
use crate::util::{copy_dir, copy_file};

use super::document::parse;
use super::layout::{Layout, LayoutError, STATIC_DIR};
use super::paths::url_to_output_path;
use super::section::{SectionError, collect_sections};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("{} exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("content error: {0}")]
    Content(#[from] SectionError),

    #[error("failed to render {page}: {source}")]
    Render { page: String, source: LayoutError },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counts reported after a successful build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub files: usize,
}

/// Builds a site from a content directory and a layout directory.
#[derive(Debug, Clone)]
pub struct Builder {
    content_dir: PathBuf,
    layout_dir: PathBuf,
    markdown: MarkdownConfig,
}

impl Builder {
    pub fn new(content_dir: PathBuf, layout_dir: PathBuf) -> Self {
        Self {
            content_dir,
            layout_dir,
            markdown: MarkdownConfig::default(),
        }
    }

    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(config.content_dir.clone(), config.layout_dir.clone())
            .with_markdown(config.markdown.clone())
    }

    pub fn with_markdown(mut self, markdown: MarkdownConfig) -> Self {
        self.markdown = markdown;
        self
    }

    /// Build the site into `dest`.
    ///
    /// Files already in `dest` are overwritten but never removed, so building
    /// into a fresh directory is the way to drop stale output.
    pub fn build(&self, dest: &Path) -> Result<BuildSummary, BuildError> {
        // Build pipeline:
        // 1. Prepare the destination directory
        // 2. Load the layout and collect sections
        // 3. Copy layout assets and static content files
        // 4. Render and write each page

        if dest.exists() && !dest.is_dir() {
            return Err(BuildError::NotADirectory(dest.to_path_buf()));
        }
        std::fs::create_dir_all(dest)?;

        info!(layout = %self.layout_dir.display(), "loading layout");
        let layout = Layout::load(&self.layout_dir)?;

        info!(content = %self.content_dir.display(), "processing content");
        let content = collect_sections(&self.content_dir, |source| parse(source, &self.markdown))?;

        let mut summary = BuildSummary::default();

        if let Some(static_dir) = layout.static_dir() {
            let copied = copy_dir(static_dir, &dest.join(STATIC_DIR))?;
            debug!(files = copied, "copied layout static files");
            summary.files += copied;
        }

        for file in content.sections.iter().flat_map(|section| &section.files) {
            debug!(file = %file.url, "copying file");
            copy_file(
                &url_to_output_path(&file.url, &self.content_dir),
                &url_to_output_path(&file.url, dest),
            )?;
            summary.files += 1;
        }

        // Walk order, so a later page overwrites an earlier one with the same URL.
        for (section, page) in content.pages() {
            let render = || -> Result<String, LayoutError> {
                layout
                    .template_for_content(&page.template)?
                    .render(&section.for_page(page))
            };
            let html = render().map_err(|source| BuildError::Render {
                page: page.source.clone(),
                source,
            })?;

            debug!(page = %page.source, url = %page.url, "writing page");
            let output_path = url_to_output_path(&page.url, dest);
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output_path, html)?;
            summary.pages += 1;
        }

        info!(
            pages = summary.pages,
            files = summary.files,
            dest = %dest.display(),
            "build complete"
        );

        Ok(summary)
    }
}
