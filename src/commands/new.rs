use anyhow::bail;
use tracing::info;

use crate::{
    NewArgs,
    config::{CONFIG_FILE, MarkdownConfig, ProjectConfig},
};

/// Files of the starter project, relative to the project directory.
const STARTER: &[(&str, &str)] = &[
    ("content/index.md", include_str!("../../starter/content/index.md")),
    ("content/blog/index.md", include_str!("../../starter/content/blog/index.md")),
    (
        "content/blog/hello-world.md",
        include_str!("../../starter/content/blog/hello-world.md"),
    ),
    ("layout/page.html.tmpl", include_str!("../../starter/layout/page.html.tmpl")),
    ("layout/list.html.tmpl", include_str!("../../starter/layout/list.html.tmpl")),
    ("layout/static/style.css", include_str!("../../starter/layout/static/style.css")),
];

pub async fn run(args: &NewArgs) -> Result<(), anyhow::Error> {
    let dir = &args.dir;
    if tokio::fs::try_exists(dir).await? {
        bail!("'{}' already exists", dir.display());
    }

    info!(dir = %dir.display(), "creating project");
    for (rel_path, contents) in STARTER {
        let path = dir.join(rel_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
    }

    let config = ProjectConfig {
        markdown: MarkdownConfig {
            extensions: vec!["tables".into(), "strikethrough".into()],
        },
        ..ProjectConfig::default()
    };
    let config_text = serde_yaml::to_string(&config)?;
    tokio::fs::write(dir.join(CONFIG_FILE), config_text).await?;

    info!(dir = %dir.display(), "project created, run `satisficer serve {}` to preview it", dir.display());

    Ok(())
}
