use crate::{CleanArgs, build::Builder, config::RootConfig};

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let loaded = RootConfig::load_from_arg(args.config_file.as_deref()).await?;
    let builder = Builder::new(loaded.config, loaded.base_path);

    builder.check_output_is_safe()?;

    let output_dir = builder.output_dir();
    if !output_dir.exists() {
        println!("Nothing to delete at {}", output_dir.display());
        return Ok(());
    }

    if args.dry_run {
        println!("Would delete {}", output_dir.display());
    } else {
        tokio::fs::remove_dir_all(&output_dir).await?;
        println!("Deleted {}", output_dir.display());
    }

    Ok(())
}
