use anyhow::{Context, Result};
use badbox_log::{Confirm, ParseConfig};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Picks the config: an explicit file must load, the per-user file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<ParseConfig> {
    if let Some(path) = explicit {
        return ParseConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let Some(path) = dirs::config_dir().map(|dir| ParseConfig::user_path(&dir)) else {
        return Ok(ParseConfig::default());
    };
    if !path.exists() {
        return Ok(ParseConfig::default());
    }
    match ParseConfig::load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(e) => {
            log::warn!("Ignoring user config: {}", e);
            Ok(ParseConfig::default())
        }
    }
}

/// The document a transcript belongs to: `main.log` was produced by `main.tex`.
pub fn default_root(transcript: &Path) -> PathBuf {
    transcript.with_extension("tex")
}

/// Removes the auxiliary file next to `root`. Returns whether one was deleted.
pub fn remove_aux(root: &Path) -> Result<bool> {
    let aux = root.with_extension("aux");
    if !aux.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&aux).with_context(|| format!("Failed to remove {}", aux.display()))?;
    log::info!("Removed {}", aux.display());
    Ok(true)
}

/// Asks on stderr and reads the answer from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        let mut stderr = io::stderr();
        if write!(stderr, "{} [y/N] ", message).and_then(|_| stderr.flush()).is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(e) => {
                log::warn!("Could not read answer: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
