use crate::model::{FeatureRow, MergedRow};
use crate::stats;

pub const MATRIX_COLUMNS: [&str; 3] = ["LifeExpectancy_z", "LogGDPpc_z", "LogPop_z"];

// Derived columns only; every value is re-derivable from the merged row.
// Logs of non-positive inputs are absent, and absence propagates through the
// z columns. Nothing is filled here; see build_matrix.
pub fn engineer_features(rows: &[MergedRow]) -> Vec<FeatureRow> {
    let life: Vec<Option<f64>> = rows.iter().map(|r| Some(r.life_expectancy_both)).collect();
    let log_gdp: Vec<Option<f64>> = rows
        .iter()
        .map(|r| log10_positive(r.gdp_per_capita_ppp))
        .collect();
    let log_pop: Vec<Option<f64>> = rows.iter().map(|r| log10_positive(r.population)).collect();

    let life_z = stats::z_scores(&life);
    let log_gdp_z = stats::z_scores(&log_gdp);
    let log_pop_z = stats::z_scores(&log_pop);

    rows.iter()
        .enumerate()
        .map(|(i, row)| FeatureRow {
            country: row.country.clone(),
            life_expectancy_both: Some(row.life_expectancy_both),
            life_expectancy_female: row.life_expectancy_female,
            life_expectancy_male: row.life_expectancy_male,
            urban_population_percentage: row.urban_population_percentage,
            urban_population_absolute: row.urban_population_absolute,
            population_density: row.population_density,
            gdp_per_capita_ppp: Some(row.gdp_per_capita_ppp),
            population: Some(row.population),
            total_gdp: Some(row.gdp_per_capita_ppp * row.population),
            log_gdp_per_capita: log_gdp[i],
            log_population: log_pop[i],
            life_expectancy_z: life_z[i],
            log_gdp_pc_z: log_gdp_z[i],
            log_pop_z: log_pop_z[i],
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    pub countries: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

// Final numeric matrix: rows sorted by country, columns as in
// MATRIX_COLUMNS. Absent z values are filled with the column mean of the
// present values here and only here, so the matrix is complete.
pub fn build_matrix(features: &[FeatureRow]) -> FeatureMatrix {
    let mut sorted: Vec<&FeatureRow> = features.iter().collect();
    sorted.sort_by(|a, b| a.country.cmp(&b.country));

    let columns = [
        fill_with_mean(&sorted.iter().map(|r| r.life_expectancy_z).collect::<Vec<_>>()),
        fill_with_mean(&sorted.iter().map(|r| r.log_gdp_pc_z).collect::<Vec<_>>()),
        fill_with_mean(&sorted.iter().map(|r| r.log_pop_z).collect::<Vec<_>>()),
    ];

    let rows = (0..sorted.len())
        .map(|i| columns.iter().map(|col| col[i]).collect())
        .collect();

    FeatureMatrix {
        countries: sorted.iter().map(|r| r.country.clone()).collect(),
        rows,
    }
}

fn fill_with_mean(column: &[Option<f64>]) -> Vec<f64> {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let fill = stats::mean(&present).unwrap_or(0.0);
    column.iter().map(|v| v.unwrap_or(fill)).collect()
}

fn log10_positive(value: f64) -> Option<f64> {
    (value > 0.0).then(|| value.log10())
}
