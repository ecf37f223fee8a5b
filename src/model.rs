use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryIndicators {
    pub life_expectancy_both: Option<f64>,
    pub life_expectancy_female: Option<f64>,
    pub life_expectancy_male: Option<f64>,
    pub urban_population_percentage: Option<f64>,
    pub urban_population_absolute: Option<u64>,
    pub population_density: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicsRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "LifeExpectancy_Both", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_both: Option<f64>,
    #[serde(rename = "LifeExpectancy_Female", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_female: Option<f64>,
    #[serde(rename = "LifeExpectancy_Male", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_male: Option<f64>,
    #[serde(rename = "UrbanPopulation_Percentage", default, deserialize_with = "lenient_f64")]
    pub urban_population_percentage: Option<f64>,
    #[serde(rename = "UrbanPopulation_Absolute", default, deserialize_with = "lenient_u64")]
    pub urban_population_absolute: Option<u64>,
    #[serde(rename = "PopulationDensity", default, deserialize_with = "lenient_f64")]
    pub population_density: Option<f64>,
}

impl DemographicsRow {
    pub fn from_parts(country: String, indicators: CountryIndicators) -> Self {
        Self {
            country,
            life_expectancy_both: indicators.life_expectancy_both,
            life_expectancy_female: indicators.life_expectancy_female,
            life_expectancy_male: indicators.life_expectancy_male,
            urban_population_percentage: indicators.urban_population_percentage,
            urban_population_absolute: indicators.urban_population_absolute,
            population_density: indicators.population_density,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GdpRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "GDP_per_capita_PPP", default, deserialize_with = "lenient_f64")]
    pub gdp_per_capita_ppp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Population", default, deserialize_with = "lenient_f64")]
    pub population: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CleanDemographicsRow {
    pub country: String,
    pub life_expectancy_both: f64,
    pub life_expectancy_female: Option<f64>,
    pub life_expectancy_male: Option<f64>,
    pub urban_population_percentage: Option<f64>,
    pub urban_population_absolute: Option<u64>,
    pub population_density: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CleanGdpRow {
    pub country: String,
    pub gdp_per_capita_ppp: f64,
}

#[derive(Debug, Clone)]
pub struct CleanPopulationRow {
    pub country: String,
    pub population: f64,
}

#[derive(Debug, Clone)]
pub struct MergedRow {
    pub country: String,
    pub life_expectancy_both: f64,
    pub life_expectancy_female: Option<f64>,
    pub life_expectancy_male: Option<f64>,
    pub urban_population_percentage: Option<f64>,
    pub urban_population_absolute: Option<u64>,
    pub population_density: Option<f64>,
    pub gdp_per_capita_ppp: f64,
    pub population: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "LifeExpectancy_Both", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_both: Option<f64>,
    #[serde(rename = "LifeExpectancy_Female", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_female: Option<f64>,
    #[serde(rename = "LifeExpectancy_Male", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_male: Option<f64>,
    #[serde(rename = "UrbanPopulation_Percentage", default, deserialize_with = "lenient_f64")]
    pub urban_population_percentage: Option<f64>,
    #[serde(rename = "UrbanPopulation_Absolute", default, deserialize_with = "lenient_u64")]
    pub urban_population_absolute: Option<u64>,
    #[serde(rename = "PopulationDensity", default, deserialize_with = "lenient_f64")]
    pub population_density: Option<f64>,
    #[serde(rename = "GDP_per_capita_PPP", default, deserialize_with = "lenient_f64")]
    pub gdp_per_capita_ppp: Option<f64>,
    #[serde(rename = "Population", default, deserialize_with = "lenient_f64")]
    pub population: Option<f64>,
    #[serde(rename = "TotalGDP", default, deserialize_with = "lenient_f64")]
    pub total_gdp: Option<f64>,
    #[serde(rename = "LogGDPperCapita", default, deserialize_with = "lenient_f64")]
    pub log_gdp_per_capita: Option<f64>,
    #[serde(rename = "LogPopulation", default, deserialize_with = "lenient_f64")]
    pub log_population: Option<f64>,
    #[serde(rename = "LifeExpectancy_z", default, deserialize_with = "lenient_f64")]
    pub life_expectancy_z: Option<f64>,
    #[serde(rename = "LogGDPpc_z", default, deserialize_with = "lenient_f64")]
    pub log_gdp_pc_z: Option<f64>,
    #[serde(rename = "LogPop_z", default, deserialize_with = "lenient_f64")]
    pub log_pop_z: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub countries_crawled: usize,
    pub demographics_kept: usize,
    pub demographics_dropped: usize,
    pub gdp_kept: usize,
    pub gdp_dropped: usize,
    pub gdp_outliers: usize,
    pub population_kept: usize,
    pub population_dropped: usize,
    pub population_outliers: usize,
    pub merged_countries: usize,
    pub lost_countries: usize,
    pub matrix_rows: usize,
    pub matrix_columns: usize,
}

// Numeric cells are coerced, never rejected: empty cells, the literal
// sentinel "None", and unparseable tokens all become absent. Rows with
// absent values are handled by the per-source validity rules later.
pub fn coerce_f64(raw: &str) -> Option<f64> {
    let token = raw.trim();
    if token.is_empty() || token == "None" {
        return None;
    }
    token.parse::<f64>().ok()
}

pub fn coerce_u64(raw: &str) -> Option<u64> {
    let token = raw.trim();
    if token.is_empty() || token == "None" {
        return None;
    }
    token.parse::<u64>().ok()
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(coerce_f64))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(coerce_u64))
}
