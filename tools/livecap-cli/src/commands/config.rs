use std::path::Path;

use livecap_common::config::{config_file_path, AppConfig};

pub fn run(app: &AppConfig, explicit: Option<&Path>, init: bool) -> anyhow::Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    if init {
        app.save_to(&path)?;
        println!("Wrote {}", path.display());
    } else {
        println!("# {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(app)?);
    Ok(())
}
