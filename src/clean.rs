use crate::model::{
    CleanDemographicsRow, CleanGdpRow, CleanPopulationRow, DemographicsRow, GdpRow, PopulationRow,
};
use crate::stats;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

// Inclusive plausibility bounds for LifeExpectancy_Both; rows outside are
// dropped, not clamped.
pub const LIFE_EXPECTANCY_BOUNDS: (f64, f64) = (40.0, 100.0);

// Known spellings that survive canonicalization but still fail to join
// across the sources. Keyed by the canonical form of the GDP/population
// spelling, mapped to the demographics spelling.
pub const COUNTRY_OVERRIDES: &[(&str, &str)] = &[
    ("Cape Verde", "Cabo Verde"),
    ("Czechia", "Czech Republic (Czechia)"),
    ("Cote D'Ivoire", "Côte D'Ivoire"),
    ("Democratic Republic Of Congo", "Dr Congo"),
    ("Reunion", "Réunion"),
    ("Curacao", "Curaçao"),
    ("Micronesia (Country)", "Micronesia"),
    ("Palestine", "State Of Palestine"),
    ("Saint Vincent And The Grenadines", "St. Vincent & Grenadines"),
    ("Sao Tome And Principe", "Sao Tome & Principe"),
    ("United States Virgin Islands", "U.S. Virgin Islands"),
    ("East Timor", "Timor-Leste"),
];

// Join-key normalization: trim, drop one leading "The ", then title-case.
// Title-casing uppercases an alphabetic character exactly when the previous
// character is non-alphabetic, so "cote d'ivoire" becomes "Cote D'Ivoire".
// Idempotent.
pub fn canonicalize_country(name: &str) -> String {
    let mut name = name.trim();
    if name
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("the "))
    {
        name = &name[4..];
    }

    let mut out = String::with_capacity(name.len());
    let mut prev_alphabetic = false;
    for ch in name.chars() {
        if ch.is_alphabetic() {
            if prev_alphabetic {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alphabetic = true;
        } else {
            out.push(ch);
            prev_alphabetic = false;
        }
    }
    out
}

pub fn override_country(name: &str) -> Option<&'static str> {
    COUNTRY_OVERRIDES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
}

// Applied to the GDP and population tables only; demographics is the naming
// authority and passes through untouched.
pub fn apply_country_overrides<R>(rows: &mut [R], country: impl Fn(&mut R) -> &mut String) {
    for row in rows.iter_mut() {
        let name = country(row);
        if let Some(mapped) = override_country(name) {
            *name = mapped.to_string();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NameMismatch {
    #[serde(rename = "Original")]
    pub original: String,
    #[serde(rename = "Standardized")]
    pub standardized: String,
}

#[derive(Debug, Default)]
pub struct DemographicsCleanOutcome {
    pub kept: Vec<CleanDemographicsRow>,
    pub dropped: Vec<DemographicsRow>,
    pub duplicates: usize,
    pub name_mismatches: Vec<NameMismatch>,
}

pub fn clean_demographics(rows: &[DemographicsRow]) -> DemographicsCleanOutcome {
    let mut outcome = DemographicsCleanOutcome::default();
    let mut seen = BTreeSet::new();
    let (lo, hi) = LIFE_EXPECTANCY_BOUNDS;

    for row in rows {
        let Some(life_both) = row.life_expectancy_both.filter(|v| (lo..=hi).contains(v)) else {
            outcome.dropped.push(row.clone());
            continue;
        };

        let canonical = canonicalize_country(&row.country);
        if !seen.insert(canonical.clone()) {
            outcome.duplicates += 1;
            continue;
        }
        if canonical != row.country {
            outcome.name_mismatches.push(NameMismatch {
                original: row.country.clone(),
                standardized: canonical.clone(),
            });
        }

        outcome.kept.push(CleanDemographicsRow {
            country: canonical,
            life_expectancy_both: life_both,
            life_expectancy_female: row.life_expectancy_female,
            life_expectancy_male: row.life_expectancy_male,
            urban_population_percentage: row.urban_population_percentage,
            urban_population_absolute: row.urban_population_absolute,
            population_density: row.population_density,
        });
    }

    if outcome.duplicates > 0 {
        warn!(duplicates = outcome.duplicates, "dropped duplicate demographics countries");
    }
    info!(
        kept = outcome.kept.len(),
        dropped = outcome.dropped.len(),
        mismatches = outcome.name_mismatches.len(),
        "demographics table cleaned"
    );

    outcome
}

#[derive(Debug, Default)]
pub struct GdpCleanOutcome {
    pub kept: Vec<CleanGdpRow>,
    pub dropped: Vec<GdpRow>,
    pub duplicates: usize,
    pub outliers: usize,
}

pub fn clean_gdp(rows: &[GdpRow]) -> GdpCleanOutcome {
    let mut outcome = GdpCleanOutcome::default();
    let mut valid = Vec::new();

    for row in rows {
        match row.gdp_per_capita_ppp {
            Some(value) => valid.push((row.country.clone(), value)),
            None => outcome.dropped.push(row.clone()),
        }
    }

    // Outliers are scanned over the raw values, before deduplication, and
    // only counted.
    let values: Vec<f64> = valid.iter().map(|(_, v)| *v).collect();
    outcome.outliers = stats::tukey_outlier_count(&values);
    info!(outliers = outcome.outliers, "gdp tukey outlier scan");

    let mut seen = BTreeSet::new();
    for (country, value) in valid {
        let canonical = canonicalize_country(&country);
        if !seen.insert(canonical.clone()) {
            outcome.duplicates += 1;
            continue;
        }
        outcome.kept.push(CleanGdpRow {
            country: canonical,
            gdp_per_capita_ppp: value,
        });
    }

    info!(
        kept = outcome.kept.len(),
        dropped = outcome.dropped.len(),
        duplicates = outcome.duplicates,
        "gdp table cleaned"
    );

    outcome
}

#[derive(Debug, Default)]
pub struct PopulationCleanOutcome {
    pub kept: Vec<CleanPopulationRow>,
    pub dropped: Vec<PopulationRow>,
    pub duplicates: usize,
    pub outliers: usize,
}

pub fn clean_population(rows: &[PopulationRow]) -> PopulationCleanOutcome {
    let mut outcome = PopulationCleanOutcome::default();
    let mut valid = Vec::new();

    for row in rows {
        match row.population {
            Some(value) => valid.push((row.country.clone(), value)),
            None => outcome.dropped.push(row.clone()),
        }
    }

    // Population is heavy-tailed; the fence is computed on the log scale so
    // large countries are not all flagged. Non-positive values cannot be
    // log-scaled and are left out of the scan.
    let log_values: Vec<f64> = valid
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(_, v)| v.log10())
        .collect();
    outcome.outliers = stats::tukey_outlier_count(&log_values);
    info!(outliers = outcome.outliers, "population log-tukey outlier scan");

    let mut seen = BTreeSet::new();
    for (country, value) in valid {
        let canonical = canonicalize_country(&country);
        if !seen.insert(canonical.clone()) {
            outcome.duplicates += 1;
            continue;
        }
        outcome.kept.push(CleanPopulationRow {
            country: canonical,
            population: value,
        });
    }

    info!(
        kept = outcome.kept.len(),
        dropped = outcome.dropped.len(),
        duplicates = outcome.duplicates,
        "population table cleaned"
    );

    outcome
}
