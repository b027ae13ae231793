use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::game::normalize::normalize_archive;
use crate::game::record::GameRecord;
use crate::store::schema::{GameInput, REPORT_VERSION, ReportData};

/// Reads game files and keeps generated reports in one directory.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating report directory {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Write a report via a temp file and rename, so a crash never leaves a
    /// half-written report behind.
    pub fn save_report(&self, name: &str, report: &ReportData) -> Result<PathBuf> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(report)?;
        let staged = (|| -> Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            Ok(())
        })();
        if let Err(e) = staged {
            let _ = fs::remove_file(&tmp_path);
            bail!("Failed to write report {}: {e}", path.display());
        }

        fs::rename(&tmp_path, &path)?;
        Ok(path)
    }

    pub fn load_report(&self, name: &str) -> Result<ReportData> {
        let path = self.file_path(name);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading report {}", path.display()))?;
        let report: ReportData = serde_json::from_str(&content)
            .with_context(|| format!("parsing report {}", path.display()))?;
        if !report.is_supported() {
            bail!(
                "Unsupported report version: {} (expected {})",
                report.report_version,
                REPORT_VERSION
            );
        }
        Ok(report)
    }

    /// Names of the stored reports, sorted.
    pub fn list_reports(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.base_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("json"))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Load games from a JSON file holding either normalized records or a raw
/// archive. Archives need `user` to decide which side of each game is ours.
pub fn load_games(path: &Path, user: Option<&str>) -> Result<Vec<GameRecord>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let input: GameInput =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    match input {
        GameInput::Records(records) => Ok(records),
        GameInput::Archive(archive) => {
            let Some(user) = user else {
                bail!("{} is a game archive; pass --user to pick the player", path.display());
            };
            Ok(normalize_archive(&archive.games, user))
        }
    }
}
