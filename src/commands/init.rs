use anyhow::Context as _;

use crate::{
    InitArgs,
    config::{DEFAULT_CONFIG_FILE, RootConfig},
};

/// Section directories created under the content root.
const SECTIONS: [&str; 4] = ["about", "projects", "research", "blog"];

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    println!("Initializing project in {}", path.display());

    let config = RootConfig::default();
    let source = path.join(&config.build.source);

    let mut dirs = vec![source.join(&config.build.templates)];
    dirs.extend(SECTIONS.iter().map(|section| source.join(&config.build.content).join(section)));
    dirs.extend(config.build.static_dirs.iter().map(|dir| source.join(dir)));
    dirs.extend(config.build.include.iter().map(|dir| source.join(dir)));

    for dir in &dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create {}", dir.display()))?;
    }

    let config_text = serde_yaml::to_string(&config)?;
    tokio::fs::write(&config_file, config_text).await?;

    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    Ok(())
}
