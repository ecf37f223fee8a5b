use anyhow::Result;
use demoscope::clean::{
    apply_country_overrides, canonicalize_country, clean_demographics, clean_gdp, override_country,
};
use demoscope::features::{build_matrix, engineer_features};
use demoscope::fetch::{Fetcher, cache_file_name};
use demoscope::model::{CleanGdpRow, DemographicsRow, GdpRow, MergedRow, coerce_f64};
use demoscope::parser::{extract_country_links, parse_country_page};
use demoscope::pipeline::merge_tables;
use demoscope::stats::{tukey_fences, tukey_outlier_count, z_scores};
use demoscope::{config::FetchConfig, model::CleanDemographicsRow, model::CleanPopulationRow};
use std::fs;
use tempfile::tempdir;

fn demographics_row(country: &str, life_both: Option<f64>) -> DemographicsRow {
    DemographicsRow {
        country: country.to_string(),
        life_expectancy_both: life_both,
        life_expectancy_female: None,
        life_expectancy_male: None,
        urban_population_percentage: None,
        urban_population_absolute: None,
        population_density: None,
    }
}

fn clean_demo_row(country: &str) -> CleanDemographicsRow {
    CleanDemographicsRow {
        country: country.to_string(),
        life_expectancy_both: 70.0,
        life_expectancy_female: None,
        life_expectancy_male: None,
        urban_population_percentage: None,
        urban_population_absolute: None,
        population_density: None,
    }
}

fn merged_row(country: &str, life_both: f64, gdp: f64, population: f64) -> MergedRow {
    MergedRow {
        country: country.to_string(),
        life_expectancy_both: life_both,
        life_expectancy_female: None,
        life_expectancy_male: None,
        urban_population_percentage: None,
        urban_population_absolute: None,
        population_density: None,
        gdp_per_capita_ppp: gdp,
        population,
    }
}

#[test]
fn canonicalization_is_idempotent() {
    for raw in [
        "  the gambia ",
        "cote d'ivoire",
        "FRANCE",
        "The Theater District",
        "bosnia and herzegovina",
        "U.S. Virgin Islands",
    ] {
        let once = canonicalize_country(raw);
        assert_eq!(canonicalize_country(&once), once, "not idempotent for {raw:?}");
    }

    assert_eq!(canonicalize_country("  the gambia "), "Gambia");
    assert_eq!(canonicalize_country("cote d'ivoire"), "Cote D'Ivoire");
    assert_eq!(canonicalize_country("THE NETHERLANDS"), "Netherlands");
    assert_eq!(canonicalize_country("bosnia and herzegovina"), "Bosnia And Herzegovina");
}

#[test]
fn overrides_rename_known_spellings_only() {
    assert_eq!(override_country("Cape Verde"), Some("Cabo Verde"));
    assert_eq!(override_country("East Timor"), Some("Timor-Leste"));
    assert_eq!(override_country("France"), None);

    let mut rows = vec![
        CleanGdpRow {
            country: "Cape Verde".to_string(),
            gdp_per_capita_ppp: 7000.0,
        },
        CleanGdpRow {
            country: "France".to_string(),
            gdp_per_capita_ppp: 50000.0,
        },
    ];
    apply_country_overrides(&mut rows, |row| &mut row.country);
    assert_eq!(rows[0].country, "Cabo Verde");
    assert_eq!(rows[1].country, "France");
}

#[test]
fn tukey_fence_flags_only_the_spike() {
    let series = [10.0, 12.0, 12.0, 13.0, 12.0, 11.0, 14.0, 13.0, 15.0, 100.0];
    assert_eq!(tukey_outlier_count(&series), 1);

    let fences = tukey_fences(&series).expect("fences for a non-empty series");
    assert!(100.0 > fences.hi);
    for value in &series[..9] {
        assert!(*value >= fences.lo && *value <= fences.hi, "{value} wrongly flagged");
    }
}

#[test]
fn outlier_scan_never_drops_rows() {
    let rows: Vec<GdpRow> = [
        ("A", 100.0),
        ("B", 110.0),
        ("C", 105.0),
        ("D", 95.0),
        ("E", 9000.0),
    ]
    .iter()
    .map(|(country, value)| GdpRow {
        country: (*country).to_string(),
        gdp_per_capita_ppp: Some(*value),
    })
    .collect();

    let outcome = clean_gdp(&rows);
    assert_eq!(outcome.outliers, 1);
    assert_eq!(outcome.kept.len(), rows.len());
    assert!(outcome.kept.iter().any(|r| r.gdp_per_capita_ppp == 9000.0));
}

#[test]
fn z_scores_have_zero_mean_unit_spread() {
    let values: Vec<Option<f64>> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|v| Some(*v)).collect();
    let scored: Vec<f64> = z_scores(&values).into_iter().flatten().collect();
    assert_eq!(scored.len(), 5);

    let mean = scored.iter().sum::<f64>() / scored.len() as f64;
    let var = scored.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / scored.len() as f64;
    assert!(mean.abs() < 1e-12);
    assert!((var.sqrt() - 1.0).abs() < 1e-12);
}

#[test]
fn z_scores_propagate_absence() {
    let values = vec![Some(1.0), None, Some(3.0)];
    let scored = z_scores(&values);
    assert!(scored[0].is_some());
    assert!(scored[1].is_none());
    assert!(scored[2].is_some());

    // Degenerate spread: every value identical.
    let flat = vec![Some(2.0), Some(2.0), Some(2.0)];
    assert!(z_scores(&flat).iter().all(Option::is_none));
}

#[test]
fn merge_keeps_shared_keys_and_reports_lost() {
    let demographics = vec![clean_demo_row("A"), clean_demo_row("B")];
    let gdp = vec![
        CleanGdpRow {
            country: "B".to_string(),
            gdp_per_capita_ppp: 1000.0,
        },
        CleanGdpRow {
            country: "C".to_string(),
            gdp_per_capita_ppp: 2000.0,
        },
    ];
    let population = vec![CleanPopulationRow {
        country: "B".to_string(),
        population: 1_000_000.0,
    }];

    let (merged, lost) = merge_tables(&demographics, &gdp, &population);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].country, "B");
    assert_eq!(lost, vec!["A".to_string(), "C".to_string()]);
}

#[test]
fn demographics_cleaner_enforces_bounds_and_unique_keys() {
    let rows = vec![
        demographics_row("Lowland", Some(39.9)),
        demographics_row("Edge Low", Some(40.0)),
        demographics_row("Edge High", Some(100.0)),
        demographics_row("Highland", Some(100.1)),
        demographics_row("Unknown", None),
        demographics_row("the gambia", Some(62.0)),
        demographics_row("Gambia", Some(63.0)),
    ];

    let outcome = clean_demographics(&rows);
    let kept: Vec<&str> = outcome.kept.iter().map(|r| r.country.as_str()).collect();
    assert_eq!(kept, vec!["Edge Low", "Edge High", "Gambia"]);
    assert!(
        outcome
            .kept
            .iter()
            .all(|r| (40.0..=100.0).contains(&r.life_expectancy_both))
    );
    assert_eq!(outcome.dropped.len(), 3);
    assert_eq!(outcome.duplicates, 1);

    let mismatch = &outcome.name_mismatches[0];
    assert_eq!(mismatch.original, "the gambia");
    assert_eq!(mismatch.standardized, "Gambia");
}

#[test]
fn gdp_cleaner_drops_absent_and_dedups_canonical_keys() {
    let rows = vec![
        GdpRow {
            country: "France".to_string(),
            gdp_per_capita_ppp: Some(50000.0),
        },
        GdpRow {
            country: "france".to_string(),
            gdp_per_capita_ppp: Some(51000.0),
        },
        GdpRow {
            country: "Erewhon".to_string(),
            gdp_per_capita_ppp: None,
        },
    ];

    let outcome = clean_gdp(&rows);
    assert_eq!(outcome.kept.len(), 1);
    assert_eq!(outcome.kept[0].country, "France");
    assert_eq!(outcome.kept[0].gdp_per_capita_ppp, 50000.0);
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(outcome.dropped.len(), 1);
    assert_eq!(outcome.dropped[0].country, "Erewhon");
}

#[test]
fn numeric_coercion_is_lenient() {
    assert_eq!(coerce_f64("1234.5"), Some(1234.5));
    assert_eq!(coerce_f64(" 42 "), Some(42.0));
    assert_eq!(coerce_f64("None"), None);
    assert_eq!(coerce_f64(""), None);
    assert_eq!(coerce_f64("n/a"), None);
}

#[test]
fn link_extraction_requires_the_heading() {
    let html = "<html><body><h2>Something else</h2><div><a href='/x/'>X</a></div></body></html>";
    assert!(extract_country_links(html, "https://example.org").is_err());
}

#[test]
fn link_extraction_collects_section_links_in_order() -> Result<()> {
    let html = r#"
        <html><body>
        <h3>Demographics of Countries</h3>
        <div>
          <a href="/demographics/albania/">Albania</a>
          <a href="/demographics/chad/">Chad</a>
          <a href="/demographics/albania-new/">Albania</a>
        </div>
        <div><a href="/elsewhere/">Elsewhere</a></div>
        </body></html>
    "#;

    let links = extract_country_links(html, "https://example.org")?;
    assert_eq!(links.len(), 2);
    // Duplicate text keeps its first position but takes the later url.
    assert_eq!(links[0].0, "Albania");
    assert_eq!(links[0].1, "https://example.org/demographics/albania-new/");
    assert_eq!(links[1].0, "Chad");
    Ok(())
}

#[test]
fn page_parser_reads_all_fields_from_fixture() -> Result<()> {
    let html = fs::read_to_string(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pages/france.html"),
    )?;
    let parsed = parse_country_page(&html);

    assert_eq!(parsed.life_expectancy_both, Some(82.5));
    assert_eq!(parsed.life_expectancy_female, Some(85.3));
    assert_eq!(parsed.life_expectancy_male, Some(79.6));
    assert_eq!(parsed.urban_population_percentage, Some(81.5));
    assert_eq!(parsed.urban_population_absolute, Some(55_123_456));
    assert_eq!(parsed.population_density, Some(119.0));
    Ok(())
}

#[test]
fn page_parser_tolerates_missing_sections() {
    let html = "<html><body><h1>Nowhere Demographics</h1><p>No structured data.</p></body></html>";
    let parsed = parse_country_page(html);
    assert_eq!(parsed, Default::default());

    let unknown_label = r#"
        <html><body>
        <div class="bg-zinc-50"><span>Median Age</span><div class="text-2xl">30.1</div></div>
        </body></html>
    "#;
    let parsed = parse_country_page(unknown_label);
    assert_eq!(parsed.life_expectancy_both, None);
}

#[test]
fn cache_keys_replace_non_alphanumerics() {
    assert_eq!(
        cache_file_name("https://www.worldometers.info/demographics/"),
        "https___www_worldometers_info_demographics_.html"
    );
}

#[test]
fn fetcher_serves_cached_pages_without_network() -> Result<()> {
    let cache_dir = tempdir()?.keep();
    let url = "https://www.worldometers.info/demographics/france-demographics/";
    fs::write(cache_dir.join(cache_file_name(url)), "<html>cached</html>")?;

    let fetcher = Fetcher::new(&FetchConfig::default(), &cache_dir)?;
    let body = fetcher.fetch(url)?;
    assert_eq!(body, "<html>cached</html>");
    Ok(())
}

#[test]
fn matrix_fills_absent_scores_with_the_column_mean() {
    let rows = vec![
        merged_row("A", 60.0, 100.0, 1_000_000.0),
        merged_row("B", 70.0, 1000.0, 2_000_000.0),
        // Zero gdp cannot be log-scaled, so its z score is absent.
        merged_row("C", 80.0, 0.0, 3_000_000.0),
    ];

    let features = engineer_features(&rows);
    assert!(features[2].log_gdp_per_capita.is_none());
    assert!(features[2].log_gdp_pc_z.is_none());
    assert_eq!(features[0].total_gdp, Some(100.0 * 1_000_000.0));

    let matrix = build_matrix(&features);
    assert_eq!(matrix.countries, vec!["A", "B", "C"]);
    assert_eq!(matrix.rows.len(), 3);

    // Present scores for the gdp column are -1 and 1; their mean fills row C.
    let filled = matrix.rows[2][1];
    assert!(filled.abs() < 1e-12);
}
