use std::path::Path;

use anyhow::bail;

use crate::cli::resolve_settings;
use crate::settings::{save_settings_to, settings_path, shellexpand_path, Settings};

pub fn show(config: Option<&Path>) -> anyhow::Result<()> {
    let settings = resolve_settings(config)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn init(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let target = match path {
        Some(p) => shellexpand_path(&p.to_string_lossy()),
        None => settings_path(),
    };
    if target.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            target.display()
        );
    }
    save_settings_to(&Settings::default(), &target)?;
    println!("Wrote default settings to {}", target.display());
    Ok(())
}

pub fn path() -> anyhow::Result<()> {
    println!("{}", settings_path().display());
    Ok(())
}
