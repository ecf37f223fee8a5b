use crate::model::{DemographicsRow, FeatureRow, GdpRow, PopulationRow};
use crate::stats::Summary;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

pub fn read_demographics_csv(path: &Path) -> Result<Vec<DemographicsRow>> {
    read_rows(path)
}

pub fn read_gdp_csv(path: &Path) -> Result<Vec<GdpRow>> {
    read_rows(path)
}

pub fn read_population_csv(path: &Path) -> Result<Vec<PopulationRow>> {
    read_rows(path)
}

pub fn read_features_csv(path: &Path) -> Result<Vec<FeatureRow>> {
    read_rows(path)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        rows.push(record.with_context(|| format!("malformed row in {}", path.display()))?);
    }
    Ok(rows)
}

pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

pub fn write_country_list(path: &Path, countries: &[String]) -> Result<()> {
    #[derive(Serialize)]
    struct CountryName<'a> {
        #[serde(rename = "Country")]
        country: &'a str,
    }

    let rows: Vec<CountryName<'_>> = countries
        .iter()
        .map(|c| CountryName { country: c })
        .collect();
    write_rows(path, &rows)
}

// Describe layout: stats as rows, one column per described series.
pub fn write_describe_csv(path: &Path, columns: &[(&str, Summary)]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec![String::new()];
    header.extend(columns.iter().map(|(name, _)| (*name).to_string()));
    writer.write_record(&header)?;

    let stats: [(&str, fn(&Summary) -> Option<f64>); 8] = [
        ("count", |s| Some(s.count as f64)),
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q25),
        ("50%", |s| s.q50),
        ("75%", |s| s.q75),
        ("max", |s| s.max),
    ];
    for (name, value_of) in stats {
        let mut record = vec![name.to_string()];
        record.extend(
            columns
                .iter()
                .map(|(_, summary)| format_stat(value_of(summary))),
        );
        writer.write_record(&record)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

pub fn write_matrix_csv(path: &Path, headers: &[&str], rows: &[Vec<f64>]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(headers)?;
    for row in rows {
        let record: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

// Raw row-major little-endian f64, no header; the row and column counts live
// in the CSV twin next to it.
pub fn write_matrix_bin(path: &Path, rows: &[Vec<f64>]) -> Result<()> {
    ensure_parent(path)?;
    let mut bytes = Vec::with_capacity(rows.iter().map(|r| r.len() * 8).sum());
    for row in rows {
        for value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn format_stat(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir {}", parent.display()))?;
    }
    Ok(())
}
