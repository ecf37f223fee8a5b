use crate::config::PipelineConfig;
use crate::pipeline::run_pipeline;
use anyhow::Result;
use serde::Serialize;
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub first_run_countries: usize,
    pub first_run_matrix_rows: usize,
    pub second_run_countries: usize,
    pub second_run_matrix_rows: usize,
    pub csv_artifacts: usize,
    pub cached_pages: usize,
}

// Self-check: the pipeline must be rerunnable against the same directories,
// with the second run served entirely from the page cache and producing the
// same matrix.
pub fn run_harness(config: &PipelineConfig) -> Result<HarnessReport> {
    if config.dirs.out_dir.exists() {
        std::fs::remove_dir_all(&config.dirs.out_dir)?;
    }

    let first = run_pipeline(config)?;
    let second = run_pipeline(config)?;

    let mut csv_artifacts = 0usize;
    for entry in WalkDir::new(&config.dirs.out_dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("csv")
        {
            csv_artifacts += 1;
        }
    }

    let mut cached_pages = 0usize;
    for entry in WalkDir::new(&config.dirs.cache_dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            cached_pages += 1;
        }
    }

    Ok(HarnessReport {
        first_run_countries: first.countries_crawled,
        first_run_matrix_rows: first.matrix_rows,
        second_run_countries: second.countries_crawled,
        second_run_matrix_rows: second.matrix_rows,
        csv_artifacts,
        cached_pages,
    })
}
