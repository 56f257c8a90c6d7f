use crate::storage::entity::record;
use crate::storage::repository::{RecordRepository, SchoolRepository, SectorKind};
use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// The metric columns summaries are computed over. A dataset need not
/// report every one of them.
pub const SUMM_FIELDS: [&str; 10] = [
    "up_to_date",
    "conditional",
    "pme",
    "pbe",
    "dtp",
    "polio",
    "mmr",
    "hib",
    "hepb",
    "vari",
];

/// Descriptive statistics of one metric within one group. `std` is the
/// unbiased sample deviation and is null for a single observation;
/// percentiles interpolate linearly between closest ranks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: u64,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub q50: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

pub fn describe(values: &[f64]) -> Option<MetricStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        Some(var.sqrt())
    } else {
        None
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Some(MetricStats {
        count: n as u64,
        mean,
        std,
        min: sorted[0],
        q25: percentile(&sorted, 0.25),
        q50: percentile(&sorted, 0.50),
        q75: percentile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

fn percentile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

fn metric_value(model: &record::Model, field: &str) -> Option<f64> {
    match field {
        "up_to_date" => model.up_to_date,
        "conditional" => model.conditional,
        "pme" => model.pme,
        "pbe" => model.pbe,
        "dtp" => model.dtp,
        "polio" => model.polio,
        "mmr" => model.mmr,
        "hib" => model.hib,
        "hepb" => model.hepb,
        "vari" => model.vari,
        _ => None,
    }
}

/// Statistics for one group: metric -> stats, over non-missing values only.
/// A metric with no values in the group gets no entry.
fn group_stats(records: &[&record::Model]) -> serde_json::Map<String, Value> {
    let mut metrics = serde_json::Map::new();
    for field in SUMM_FIELDS {
        let values: Vec<f64> = records.iter().filter_map(|r| metric_value(r, field)).collect();
        if let Some(stats) = describe(&values) {
            metrics.insert(
                field.to_string(),
                serde_json::to_value(stats).unwrap_or(Value::Null),
            );
        }
    }
    metrics
}

/// The summary document for one selection of records: `public` and
/// `private` partitions (present only when non-empty) plus the whole
/// selection as `all`. An empty selection yields no document.
pub fn summarize(
    records: &[record::Model],
    public_by_school: &HashMap<i32, bool>,
) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let all: Vec<&record::Model> = records.iter().collect();
    let (public, private): (Vec<&record::Model>, Vec<&record::Model>) = records
        .iter()
        .partition(|r| public_by_school.get(&r.school_id).copied().unwrap_or(false));

    let mut document = serde_json::Map::new();
    if !public.is_empty() {
        document.insert("public".to_string(), Value::Object(group_stats(&public)));
    }
    if !private.is_empty() {
        document.insert("private".to_string(), Value::Object(group_stats(&private)));
    }
    document.insert("all".to_string(), Value::Object(group_stats(&all)));

    Some(Value::Object(document).to_string())
}

/// Summary for one (dataset, sector): reported records of schools in the
/// sector. `None` when the sector has no reported records in this dataset.
pub async fn generate_summary<C: ConnectionTrait>(
    conn: &C,
    dataset_id: i32,
    kind: SectorKind,
    sector_id: i32,
) -> Result<Option<String>, DbErr> {
    let school_ids = SchoolRepository::ids_in_sector(conn, kind, sector_id).await?;
    if school_ids.is_empty() {
        return Ok(None);
    }

    let records = RecordRepository::reported_for_dataset(conn, dataset_id, &school_ids).await?;
    if records.is_empty() {
        return Ok(None);
    }

    let public_by_school = SchoolRepository::public_flags(conn, &school_ids).await?;
    Ok(summarize(&records, &public_by_school))
}
