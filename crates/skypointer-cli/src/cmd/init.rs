use anyhow::Context;
use skypointer_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing skypointer in: {}", root.display());

    let dir = paths::pointer_dir(root);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let data = serde_yaml::to_string(&Config::default())?;
    let created = io::write_if_missing(&paths::config_path(root), data.as_bytes())
        .context("failed to write config.yaml")?;
    if created {
        println!("  created: .skypointer/config.yaml");
    } else {
        println!("  exists:  .skypointer/config.yaml");
    }

    if !paths::position_path(root).exists() {
        println!("\nNext: skypointer calibrate");
    }
    Ok(())
}
