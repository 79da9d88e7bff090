use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use super::markdown::{MarkdownError, render_markdown};
use crate::config::MarkdownConfig;

const DELIMITER: &str = "---";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("could not find front matter")]
    NoFrontMatter,

    #[error("failed to decode front matter: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing required front matter fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error(transparent)]
    Markdown(#[from] MarkdownError),
}

// =============================================================================
// Front matter
// =============================================================================

/// Validated front matter metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub title: String,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// Name of the layout template used to render the page
    pub template: String,
    /// Write the page to `name.html` instead of `name/index.html`
    pub ugly_url: bool,
}

/// Front matter as decoded, before required fields are checked.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrontMatter {
    title: Option<String>,
    created_at: Option<DateTime<FixedOffset>>,
    updated_at: Option<DateTime<FixedOffset>>,
    template: Option<String>,
    #[serde(rename = "uglyURL", default)]
    ugly_url: bool,
}

impl RawFrontMatter {
    fn validate(self) -> Result<FrontMatter, ContentError> {
        let title = self.title.filter(|t| !t.is_empty());
        let template = self.template.filter(|t| !t.is_empty());

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title".to_string());
        }
        if self.created_at.is_none() {
            missing.push("createdAt".to_string());
        }
        if template.is_none() {
            missing.push("template".to_string());
        }

        match (title, self.created_at, template) {
            (Some(title), Some(created_at), Some(template)) => Ok(FrontMatter {
                title,
                created_at,
                updated_at: self.updated_at,
                template,
                ugly_url: self.ugly_url,
            }),
            _ => Err(ContentError::MissingFields(missing)),
        }
    }
}

// =============================================================================
// Parsed content
// =============================================================================

/// A content file split into validated front matter and rendered HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedContent {
    pub front_matter: FrontMatter,
    pub html: String,
}

/// Parse a content file.
///
/// The file must open with a `---` line. Lines up to the next `---` line are a
/// JSON front matter block; everything after it is markdown:
///
/// ```markdown
/// ---
/// {
///   "title": "My Page",
///   "createdAt": "2025-05-13T00:00:00Z",
///   "template": "page.html.tmpl"
/// }
/// ---
///
/// # Content starts here
/// ```
pub fn parse(source: &str, markdown_config: &MarkdownConfig) -> Result<ParsedContent, ContentError> {
    let (front_matter, body) = split_front_matter(source)?;

    let raw: RawFrontMatter = serde_json::from_str(&front_matter)?;
    let front_matter = raw.validate()?;
    let html = render_markdown(&body, markdown_config)?;

    Ok(ParsedContent { front_matter, html })
}

/// Split the raw file into front matter text and body text.
fn split_front_matter(source: &str) -> Result<(String, String), ContentError> {
    let mut lines = source.lines();

    match lines.next() {
        Some(first) if is_delimiter(first) => {}
        _ => return Err(ContentError::NoFrontMatter),
    }

    let mut front_matter = String::new();
    let mut body = String::new();
    let mut in_front_matter = true;

    for line in lines {
        if in_front_matter && is_delimiter(line) {
            in_front_matter = false;
            continue;
        }

        let target = if in_front_matter {
            &mut front_matter
        } else {
            &mut body
        };
        target.push_str(line);
        target.push('\n');
    }

    Ok((front_matter, body))
}

fn is_delimiter(line: &str) -> bool {
    line.trim_matches([' ', '\t', '\r']) == DELIMITER
}
