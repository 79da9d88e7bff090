//! Configuration type definitions.
//!
//! This module contains the data structures read from `satisficer.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Project configuration. Every field has a default, so the file is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory holding markdown pages and static content files
    pub content_dir: PathBuf,
    /// Directory holding `.html.tmpl` templates and the `static/` assets
    pub layout_dir: PathBuf,
    pub markdown: MarkdownConfig,
    /// Development-specific settings (preview server, polling)
    pub dev: DevConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            layout_dir: PathBuf::from("layout"),
            markdown: MarkdownConfig::default(),
            dev: DevConfig::default(),
        }
    }
}

/// Markdown processing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Enabled pulldown-cmark extensions (e.g. "tables", "footnotes")
    pub extensions: Vec<String>,
}

/// Preview server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    pub bind: String,
    pub port: u16,
    /// How often the project tree is scanned for changes
    pub poll_interval_ms: u64,
    /// What the server shows after a failed rebuild
    pub on_error: ErrorPolicy,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            poll_interval_ms: 300,
            on_error: ErrorPolicy::default(),
        }
    }
}

/// How the preview server responds while the latest build is failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Answer every file request with the build error.
    #[default]
    ShowError,
    /// Keep serving the last successful build.
    KeepLastGood,
}
