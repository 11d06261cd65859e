//! Check system capabilities.

use livecap_platform_core::{CaptureMode, PlatformFamily};

use super::backend;

pub fn run(synthetic: bool) -> anyhow::Result<()> {
    let backend = backend(synthetic);

    println!("livecap System Check");
    println!("{}", "=".repeat(50));
    println!("Platform: {:?}", PlatformFamily::current());
    println!("Backend:  {}", backend.name());
    println!();

    for mode in CaptureMode::ALL {
        let tag = if backend.supports(mode) { "OK" } else { "--" };
        println!("[{tag}] {mode}");
    }
    println!();

    match backend.monitors() {
        Ok(monitors) => {
            println!("Monitors: {}", monitors.len());
            for m in &monitors {
                println!(
                    "     {}: {} {}x{} at ({}, {}) (scale: {}x) {}",
                    m.index,
                    m.name,
                    m.width,
                    m.height,
                    m.x,
                    m.y,
                    m.scale_factor,
                    if m.primary { "(primary)" } else { "" }
                );
            }
        }
        Err(e) => println!("[WARN] Monitors unavailable: {e}"),
    }

    match backend.windows() {
        Ok(windows) => {
            println!("Windows: {}", windows.len());
            for w in windows.iter().filter(|w| !w.title.trim().is_empty()) {
                println!(
                    "     {} [{}] {}x{}{}",
                    w.title,
                    w.app_name,
                    w.width,
                    w.height,
                    if w.minimized { " (minimized)" } else { "" }
                );
            }
        }
        Err(e) => println!("[WARN] Windows unavailable: {e}"),
    }

    Ok(())
}
