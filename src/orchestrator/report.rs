// src/orchestrator/report.rs
// Writes sorted, newline-delimited URL lists next to a crawl run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const INDEXED_REPORT: &str = "urls_indexed.txt";
pub const REMOVED_REPORT: &str = "urls_removed.txt";

pub async fn write_url_report<'u>(
    dir: &Path,
    name: &str,
    urls: impl IntoIterator<Item = &'u String>,
) -> Result<PathBuf> {
    let mut sorted: Vec<&String> = urls.into_iter().collect();
    sorted.sort();

    let mut body = String::new();
    for url in sorted {
        body.push_str(url);
        body.push('\n');
    }

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating report directory {}", dir.display()))?;
    let path = dir.join(name);
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
