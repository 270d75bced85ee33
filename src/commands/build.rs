use crate::{BuildArgs, build::Builder, config::RootConfig};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let loaded = RootConfig::load_from_arg(args.config_file.as_deref()).await?;

    let builder = Builder::new(loaded.config, loaded.base_path);
    let result = builder.build().await?;

    if !result.skipped.is_empty() {
        let skipped = result
            .skipped
            .iter()
            .map(|doc| format!("{} ({})", doc.path.display(), doc.error))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::warn!(count = result.skipped.len(), %skipped, "built without some documents");
    }

    println!(
        "Built site to {} ({} pages, {} section indexes, {} static files)",
        result.output_dir.display(),
        result.pages,
        result.section_indexes,
        result.static_files
    );

    Ok(())
}
