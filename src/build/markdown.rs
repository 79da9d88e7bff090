//! Markdown rendering with external link annotation.

use std::fmt;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use pulldown_cmark_escape::{escape_href, escape_html};

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Render markdown to HTML using pulldown-cmark.
///
/// Links pointing at `http://` or `https://` destinations open in a new tab.
pub fn render_markdown(
    markdown: &str,
    markdown_config: &MarkdownConfig,
) -> Result<String, MarkdownError> {
    let options = parser_options(markdown_config)?;
    let parser = Parser::new_ext(markdown, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, external_links(parser));

    Ok(html_output)
}

fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Rewrite the opening tag of external links to carry `target` and `rel`.
///
/// The matching `End` event is left alone, the HTML writer closes it with `</a>`.
fn external_links<'a>(events: impl Iterator<Item = Event<'a>>) -> impl Iterator<Item = Event<'a>> {
    events.map(|event| {
        if let Event::Start(Tag::Link {
            dest_url, title, ..
        }) = &event
            && is_external(dest_url)
            && let Ok(tag) = external_link_tag(dest_url, title)
        {
            return Event::Html(CowStr::from(tag));
        }
        event
    })
}

fn is_external(dest: &str) -> bool {
    dest.starts_with("http://") || dest.starts_with("https://")
}

/// Escaped the same way the HTML writer escapes ordinary links.
fn external_link_tag(dest_url: &str, title: &str) -> Result<String, fmt::Error> {
    let mut tag = String::from("<a href=\"");
    escape_href(&mut tag, dest_url)?;
    if !title.is_empty() {
        tag.push_str("\" title=\"");
        escape_html(&mut tag, title)?;
    }
    tag.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
    Ok(tag)
}
