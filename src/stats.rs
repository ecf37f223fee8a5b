#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lo: f64,
    pub hi: f64,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

// ddof 0 gives the population deviation, ddof 1 the sample deviation.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    if values.len() <= ddof {
        return None;
    }
    let center = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - center).powi(2)).sum::<f64>();
    Some((sum_sq / (values.len() - ddof) as f64).sqrt())
}

// Linearly interpolated percentile over a sorted slice, q in [0, 1].
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let frac = pos - lower as f64;
    Some(sorted[lower] + frac * (sorted[upper] - sorted[lower]))
}

pub fn tukey_fences(values: &[f64]) -> Option<Fences> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = percentile(&sorted, 0.25)?;
    let q3 = percentile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some(Fences {
        lo: q1 - 1.5 * iqr,
        hi: q3 + 1.5 * iqr,
    })
}

// Count-only: callers never drop rows based on this.
pub fn tukey_outlier_count(values: &[f64]) -> usize {
    let Some(fences) = tukey_fences(values) else {
        return 0;
    };
    values
        .iter()
        .filter(|v| **v < fences.lo || **v > fences.hi)
        .count()
}

// Z-scores with the population standard deviation (divisor N). The mean and
// deviation are computed over present values only; absent inputs stay absent,
// and a degenerate spread (zero or non-finite) makes the whole column absent.
pub fn z_scores(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let center = mean(&present);
    let spread = std_dev(&present, 0);
    match (center, spread) {
        (Some(center), Some(spread)) if spread > 0.0 && spread.is_finite() => values
            .iter()
            .map(|v| v.map(|v| (v - center) / spread))
            .collect(),
        _ => vec![None; values.len()],
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

// Summary statistics over the present values of a series. The deviation
// here is the sample deviation (divisor N-1), unlike z_scores.
pub fn describe(values: &[Option<f64>]) -> Summary {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));
    Summary {
        count: present.len(),
        mean: mean(&present),
        std: std_dev(&present, 1),
        min: present.first().copied(),
        q25: percentile(&present, 0.25),
        q50: percentile(&present, 0.50),
        q75: percentile(&present, 0.75),
        max: present.last().copied(),
    }
}
