use tracing::info;

use crate::{BuildArgs, build::Builder, config::ProjectConfig};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config = ProjectConfig::load(&args.project)?;

    let builder = Builder::from_config(&config);
    let output = args.output.clone();
    let summary = tokio::task::spawn_blocking(move || builder.build(&output)).await??;

    info!(
        "Built site to {} ({} pages, {} files)",
        args.output.display(),
        summary.pages,
        summary.files
    );

    Ok(())
}
