use crate::clean::{self, apply_country_overrides};
use crate::config::PipelineConfig;
use crate::features;
use crate::fetch::Fetcher;
use crate::model::{
    CleanDemographicsRow, CleanGdpRow, CleanPopulationRow, DemographicsRow, GdpRow, MergedRow,
    PipelineReport, PopulationRow,
};
use crate::parser::{extract_country_links, parse_country_page};
use crate::stats;
use crate::store;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

// One row per discovered country, in link discovery order. Persisting writes
// the staged snapshots (pre-sort preview, post-sort preview, full table) and
// sorts the returned table as a side effect.
pub fn crawl_demographics(
    fetcher: &Fetcher,
    config: &PipelineConfig,
    persist: bool,
) -> Result<Vec<DemographicsRow>> {
    let index_url = config.fetch.index_url();
    let index_html = fetcher
        .fetch(&index_url)
        .with_context(|| format!("failed to fetch index page {index_url}"))?;
    let links = extract_country_links(&index_html, &config.fetch.base_url)?;
    info!(countries = links.len(), "extracted country links");

    let mut rows = Vec::with_capacity(links.len());
    for (country, url) in &links {
        let html = fetcher
            .fetch(url)
            .with_context(|| format!("failed to fetch page for {country}"))?;
        let indicators = parse_country_page(&html);
        debug!(country = %country, "parsed country page");
        rows.push(DemographicsRow::from_parts(country.clone(), indicators));
    }

    if persist {
        let out_dir = &config.dirs.out_dir;
        store::write_rows(&out_dir.join("demographics_before_sort.csv"), head(&rows, 10))?;
        rows.sort_by(|a, b| a.country.cmp(&b.country));
        store::write_rows(&out_dir.join("demographics_after_sort.csv"), head(&rows, 10))?;
        store::write_rows(&out_dir.join("demographics_data.csv"), &rows)?;
    }

    info!(countries = rows.len(), persist, "demographics crawl complete");
    Ok(rows)
}

// Inner join on the canonical country key; a country missing from any table
// is excluded. Lost countries are those in the union of the three cleaned
// key sets that did not survive the join, sorted ascending.
pub fn merge_tables(
    demographics: &[CleanDemographicsRow],
    gdp: &[CleanGdpRow],
    population: &[CleanPopulationRow],
) -> (Vec<MergedRow>, Vec<String>) {
    let gdp_by_country: BTreeMap<&str, &CleanGdpRow> =
        gdp.iter().map(|r| (r.country.as_str(), r)).collect();
    let pop_by_country: BTreeMap<&str, &CleanPopulationRow> =
        population.iter().map(|r| (r.country.as_str(), r)).collect();

    let mut merged = Vec::new();
    for row in demographics {
        let (Some(g), Some(p)) = (
            gdp_by_country.get(row.country.as_str()),
            pop_by_country.get(row.country.as_str()),
        ) else {
            continue;
        };
        merged.push(MergedRow {
            country: row.country.clone(),
            life_expectancy_both: row.life_expectancy_both,
            life_expectancy_female: row.life_expectancy_female,
            life_expectancy_male: row.life_expectancy_male,
            urban_population_percentage: row.urban_population_percentage,
            urban_population_absolute: row.urban_population_absolute,
            population_density: row.population_density,
            gdp_per_capita_ppp: g.gdp_per_capita_ppp,
            population: p.population,
        });
    }

    let merged_keys: BTreeSet<&str> = merged.iter().map(|r| r.country.as_str()).collect();
    let union: BTreeSet<&str> = demographics
        .iter()
        .map(|r| r.country.as_str())
        .chain(gdp.iter().map(|r| r.country.as_str()))
        .chain(population.iter().map(|r| r.country.as_str()))
        .collect();
    let lost: Vec<String> = union
        .into_iter()
        .filter(|c| !merged_keys.contains(c))
        .map(ToString::to_string)
        .collect();

    (merged, lost)
}

pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    let out_dir = &config.dirs.out_dir;

    let fetcher = Fetcher::new(&config.fetch, &config.dirs.cache_dir)?;
    let demographics = crawl_demographics(&fetcher, config, config.persist.snapshots)?;

    let gdp_path = config.gdp_path();
    let gdp_raw = store::read_gdp_csv(&gdp_path)
        .with_context(|| format!("failed to load gdp table {}", gdp_path.display()))?;
    let population_path = config.population_path();
    let population_raw = store::read_population_csv(&population_path)
        .with_context(|| format!("failed to load population table {}", population_path.display()))?;
    info!(
        gdp_rows = gdp_raw.len(),
        population_rows = population_raw.len(),
        "raw source tables loaded"
    );

    if config.persist.snapshots {
        persist_source_previews(config, &gdp_raw, &population_raw)?;
    }

    let demo_outcome = clean::clean_demographics(&demographics);
    let gdp_outcome = clean::clean_gdp(&gdp_raw);
    let population_outcome = clean::clean_population(&population_raw);

    store::write_rows(&out_dir.join("dropped_demographics.csv"), &demo_outcome.dropped)?;
    store::write_rows(&out_dir.join("dropped_gdp.csv"), &gdp_outcome.dropped)?;
    store::write_rows(&out_dir.join("dropped_population.csv"), &population_outcome.dropped)?;
    store::write_rows(&out_dir.join("name_mismatches.csv"), &demo_outcome.name_mismatches)?;

    let mut gdp_clean = gdp_outcome.kept;
    apply_country_overrides(&mut gdp_clean, |row| &mut row.country);
    let mut population_clean = population_outcome.kept;
    apply_country_overrides(&mut population_clean, |row| &mut row.country);

    let (merged, lost) = merge_tables(&demo_outcome.kept, &gdp_clean, &population_clean);
    store::write_country_list(&out_dir.join("lost_countries.csv"), &lost)?;
    info!(
        merged = merged.len(),
        lost = lost.len(),
        "tables merged on country key"
    );

    let feature_rows = features::engineer_features(&merged);
    store::write_rows(&out_dir.join("features_data.csv"), &feature_rows)?;

    let z_summaries = [
        (
            "LifeExpectancy_z",
            stats::describe(&feature_rows.iter().map(|r| r.life_expectancy_z).collect::<Vec<_>>()),
        ),
        (
            "LogGDPpc_z",
            stats::describe(&feature_rows.iter().map(|r| r.log_gdp_pc_z).collect::<Vec<_>>()),
        ),
        (
            "LogPop_z",
            stats::describe(&feature_rows.iter().map(|r| r.log_pop_z).collect::<Vec<_>>()),
        ),
    ];
    store::write_describe_csv(&out_dir.join("X_scaled_describe.csv"), &z_summaries)?;

    let matrix = features::build_matrix(&feature_rows);
    store::write_matrix_csv(&out_dir.join("X_scaled.csv"), &features::MATRIX_COLUMNS, &matrix.rows)?;
    store::write_matrix_bin(&out_dir.join("X.bin"), &matrix.rows)?;

    let report = PipelineReport {
        countries_crawled: demographics.len(),
        demographics_kept: demo_outcome.kept.len(),
        demographics_dropped: demo_outcome.dropped.len(),
        gdp_kept: gdp_clean.len(),
        gdp_dropped: gdp_outcome.dropped.len(),
        gdp_outliers: gdp_outcome.outliers,
        population_kept: population_clean.len(),
        population_dropped: population_outcome.dropped.len(),
        population_outliers: population_outcome.outliers,
        merged_countries: merged.len(),
        lost_countries: lost.len(),
        matrix_rows: matrix.rows.len(),
        matrix_columns: features::MATRIX_COLUMNS.len(),
    };
    info!(
        countries = report.matrix_rows,
        lost = report.lost_countries,
        "pipeline complete"
    );

    Ok(report)
}

fn persist_source_previews(
    config: &PipelineConfig,
    gdp_raw: &[GdpRow],
    population_raw: &[PopulationRow],
) -> Result<()> {
    let out_dir = &config.dirs.out_dir;

    store::write_rows(&out_dir.join("gdp_before_sort.csv"), head(gdp_raw, 5))?;
    let mut gdp_sorted = gdp_raw.to_vec();
    gdp_sorted.sort_by(|a, b| a.country.cmp(&b.country));
    store::write_rows(&out_dir.join("gdp_after_sort.csv"), head(&gdp_sorted, 5))?;
    store::write_describe_csv(
        &out_dir.join("gdp_describe.csv"),
        &[(
            "GDP_per_capita_PPP",
            stats::describe(&gdp_raw.iter().map(|r| r.gdp_per_capita_ppp).collect::<Vec<_>>()),
        )],
    )?;

    store::write_rows(&out_dir.join("pop_before_sort.csv"), head(population_raw, 5))?;
    let mut population_sorted = population_raw.to_vec();
    population_sorted.sort_by(|a, b| a.country.cmp(&b.country));
    store::write_rows(&out_dir.join("pop_after_sort.csv"), head(&population_sorted, 5))?;
    store::write_describe_csv(
        &out_dir.join("pop_describe.csv"),
        &[(
            "Population",
            stats::describe(&population_raw.iter().map(|r| r.population).collect::<Vec<_>>()),
        )],
    )?;

    Ok(())
}

fn head<T>(rows: &[T], n: usize) -> &[T] {
    &rows[..rows.len().min(n)]
}
