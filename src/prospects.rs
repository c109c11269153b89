use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    io::ErrorKind,
    sync::{Arc, RwLock},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prospect {
    pub name: String,
    /// Unique key across the store
    pub site: String,
    pub channel: String,
    pub category: String,
    pub region: String,
    pub handle: String,

    pub has_qr: bool,
    pub has_link: bool,
    pub has_card: bool,
    pub delivery: bool,

    pub reviews: Option<u32>,
    pub rating: Option<f32>,
    pub followers: Option<u32>,

    /// Prior similarity in [0, 1], blended with freshly computed scores
    pub similarity_seed: f32,

    pub lat: f64,
    pub lon: f64,

    /// Computed similarity in [0, 100]
    pub similarity_score: f32,
}

/// Concatenation of the text fields used for scoring
pub fn prospect_text(p: &Prospect) -> String {
    format!("{} {} {}", p.name, p.category, p.handle)
}

/// Drop duplicate sites, first occurrence wins.
pub fn dedup_by_site(rows: Vec<Prospect>) -> Vec<Prospect> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|p| seen.insert(p.site.clone()))
        .collect()
}

const CSV_HEADERS: [&str; 17] = [
    "name",
    "site",
    "channel",
    "category",
    "region",
    "handle",
    "has_qr",
    "has_link",
    "has_card",
    "delivery",
    "reviews",
    "rating",
    "followers",
    "similarity_seed",
    "lat",
    "lon",
    "similarity_score",
];

/// Persisted prospect set. The whole collection is replaced on refresh;
/// the write lock is held across merge, rescore and persist so concurrent
/// refreshes can't interleave their read-modify-write.
#[derive(Debug, Clone, Default)]
pub struct ProspectStore {
    list: Arc<RwLock<Vec<Prospect>>>,
    path: String,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1")
}

fn parse_opt<T: std::str::FromStr>(value: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value.parse::<T>().map_err(anyhow::Error::new)?))
}

impl ProspectStore {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if let Err(err) = std::fs::metadata(path) {
            match err.kind() {
                ErrorKind::NotFound => {
                    log::info!("creating new prospect store at {path}");
                    let mut csv_wrt = csv::Writer::from_path(path)?;
                    csv_wrt.write_record(CSV_HEADERS)?;
                    csv_wrt.flush()?;
                }
                _ => Err(err)?,
            }
        }

        let mut csv_reader = csv::Reader::from_path(path)?;

        let mut list = vec![];
        for record in csv_reader.records() {
            let record = record?;
            let field = |idx: usize| -> anyhow::Result<&str> {
                record
                    .get(idx)
                    .ok_or_else(|| anyhow!("prospect record is missing column {}", CSV_HEADERS[idx]))
            };

            let prospect = Prospect {
                name: field(0)?.to_string(),
                site: field(1)?.to_string(),
                channel: field(2)?.to_string(),
                category: field(3)?.to_string(),
                region: field(4)?.to_string(),
                handle: field(5)?.to_string(),
                has_qr: parse_bool(field(6)?),
                has_link: parse_bool(field(7)?),
                has_card: parse_bool(field(8)?),
                delivery: parse_bool(field(9)?),
                reviews: parse_opt(field(10)?)?,
                rating: parse_opt(field(11)?)?,
                followers: parse_opt(field(12)?)?,
                similarity_seed: field(13)?.trim().parse().unwrap_or(0.0),
                lat: field(14)?.trim().parse().unwrap_or(0.0),
                lon: field(15)?.trim().parse().unwrap_or(0.0),
                similarity_score: field(16)?.trim().parse().unwrap_or(0.0),
            };

            list.push(prospect);
        }

        log::info!("loaded {} prospects from {path}", list.len());

        Ok(ProspectStore {
            list: Arc::new(RwLock::new(list)),
            path: path.to_string(),
        })
    }

    pub fn snapshot(&self) -> Vec<Prospect> {
        self.list.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.list.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.read().unwrap().is_empty()
    }

    /// Fold discovered candidates into the store: concat existing + new,
    /// dedup by site (existing rows win), rescore the whole merged set and
    /// persist it wholesale. Returns the merged rows.
    pub fn merge_and_store<F>(
        &self,
        discovered: Vec<Prospect>,
        rescore: F,
    ) -> anyhow::Result<Vec<Prospect>>
    where
        F: FnOnce(&[Prospect]) -> anyhow::Result<Vec<f32>>,
    {
        let mut list = self.list.write().unwrap();

        let mut merged: Vec<Prospect> = list.clone();
        merged.extend(discovered);
        let mut merged = dedup_by_site(merged);

        let scores = rescore(&merged)?;
        for (prospect, score) in merged.iter_mut().zip(scores) {
            prospect.similarity_score = score;
        }

        save_to(&self.path, &merged)?;
        *list = merged.clone();

        Ok(merged)
    }

    #[cfg(test)]
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn save_to(path: &str, rows: &[Prospect]) -> anyhow::Result<()> {
    let temp_path = format!("{path}-tmp");
    let mut csv_wrt = csv::Writer::from_path(&temp_path)?;
    csv_wrt.write_record(CSV_HEADERS)?;
    for p in rows.iter() {
        csv_wrt.write_record([
            p.name.as_str(),
            p.site.as_str(),
            p.channel.as_str(),
            p.category.as_str(),
            p.region.as_str(),
            p.handle.as_str(),
            if p.has_qr { "true" } else { "false" },
            if p.has_link { "true" } else { "false" },
            if p.has_card { "true" } else { "false" },
            if p.delivery { "true" } else { "false" },
            &p.reviews.map(|v| v.to_string()).unwrap_or_default(),
            &p.rating.map(|v| v.to_string()).unwrap_or_default(),
            &p.followers.map(|v| v.to_string()).unwrap_or_default(),
            &p.similarity_seed.to_string(),
            &p.lat.to_string(),
            &p.lon.to_string(),
            &p.similarity_score.to_string(),
        ])?;
    }
    csv_wrt.flush()?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

/// Region-filtered (case-insensitive), score-sorted, limit-truncated view.
pub fn region_view(rows: &[Prospect], region: &str, limit: usize) -> Vec<Prospect> {
    let region = region.to_lowercase();
    let mut view: Vec<Prospect> = rows
        .iter()
        .filter(|p| p.region.to_lowercase() == region)
        .cloned()
        .collect();
    view.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    view.truncate(limit);
    view
}

#[cfg(test)]
pub fn test_prospect(name: &str, site: &str, region: &str) -> Prospect {
    Prospect {
        name: name.to_string(),
        site: site.to_string(),
        channel: "web".to_string(),
        category: "retail".to_string(),
        region: region.to_string(),
        handle: format!("@{}", name.to_lowercase().replace(' ', "")),
        similarity_seed: 0.65,
        lat: -12.0464,
        lon: -77.0428,
        ..Default::default()
    }
}
