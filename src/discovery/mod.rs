//! Prospect candidate discovery via search-engine scraping.
//!
//! Builds region + industry/keyword queries, fetches each through the
//! proxy, parses organic results into prospect candidates and assigns
//! synthetic geolocation. A failing source contributes zero candidates;
//! discovery as a whole never fails because of one source.

pub mod geo;
mod parse;
mod proxy;

pub use proxy::{ProxyFetcher, SearchFetcher};

use crate::{
    config::DiscoveryConfig,
    prospects::{dedup_by_site, Prospect},
};
use rand::Rng;
use std::sync::Arc;
use url::Url;

/// Seed similarity attached to every discovered candidate
const SEED_SIMILARITY: f32 = 0.65;
/// Max synthesized handle length, in chars
const MAX_HANDLE_CHARS: usize = 30;

const SEARCH_ENGINE: &str = "https://www.bing.com/search";

#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    pub region: String,
    pub industries: Vec<String>,
    pub keywords: Vec<String>,
}

/// Outcome of a single source query. Failures are dropped by the caller
/// but keep their reason so they can be logged.
enum SourceOutcome {
    Fetched(Vec<Prospect>),
    Failed { query: String, reason: String },
}

pub struct DiscoveryClient {
    fetcher: Arc<dyn SearchFetcher>,
    config: DiscoveryConfig,
}

impl DiscoveryClient {
    pub fn new(config: DiscoveryConfig, fetcher: Arc<dyn SearchFetcher>) -> Self {
        Self { fetcher, config }
    }

    /// Two query variants per industry, one per keyword, two generic
    /// regional fallbacks when neither is given. Capped at max_sources;
    /// excess queries are dropped, not queued.
    pub fn build_queries(&self, request: &DiscoveryRequest) -> Vec<String> {
        let region = &request.region;
        let mut queries = vec![];

        for industry in &request.industries {
            queries.push(format!("{industry} {region} tienda directorio"));
            queries.push(format!("{industry} {region} negocios en línea"));
        }
        for keyword in &request.keywords {
            queries.push(format!("{keyword} {region} negocio"));
        }

        if queries.is_empty() {
            queries.push(format!("negocios {region} tienda directorio"));
            queries.push(format!("comercios {region} en línea"));
        }

        queries.truncate(self.config.max_sources);
        queries
    }

    /// Run every query, swallow per-source failures, dedup by site
    /// (first occurrence wins) and truncate to max_items.
    pub fn discover<R: Rng>(&self, request: &DiscoveryRequest, rng: &mut R) -> Vec<Prospect> {
        let mut candidates = vec![];

        for query in self.build_queries(request) {
            match self.run_source(&query, request, rng) {
                SourceOutcome::Fetched(mut rows) => {
                    log::debug!("source {query:?} yielded {} candidates", rows.len());
                    candidates.append(&mut rows);
                }
                SourceOutcome::Failed { query, reason } => {
                    log::warn!("source {query:?} skipped: {reason}");
                }
            }
        }

        let mut candidates = dedup_by_site(candidates);
        candidates.truncate(self.config.max_items);
        candidates
    }

    fn run_source<R: Rng>(
        &self,
        query: &str,
        request: &DiscoveryRequest,
        rng: &mut R,
    ) -> SourceOutcome {
        let search_url = match Url::parse_with_params(SEARCH_ENGINE, &[("q", query)]) {
            Ok(url) => url,
            Err(err) => {
                return SourceOutcome::Failed {
                    query: query.to_string(),
                    reason: err.to_string(),
                }
            }
        };

        let html = match self.fetcher.fetch(search_url.as_str()) {
            Ok(html) => html,
            Err(err) => {
                return SourceOutcome::Failed {
                    query: query.to_string(),
                    reason: err.to_string(),
                }
            }
        };

        let rows = parse::parse_organic_results(&html)
            .into_iter()
            .map(|entry| self.candidate(entry, request, rng))
            .collect();

        SourceOutcome::Fetched(rows)
    }

    fn candidate<R: Rng>(
        &self,
        entry: parse::ResultEntry,
        request: &DiscoveryRequest,
        rng: &mut R,
    ) -> Prospect {
        let handle: String = format!("@{}", entry.name.to_lowercase().replace(' ', ""))
            .chars()
            .take(MAX_HANDLE_CHARS)
            .collect();
        let (lat, lon) = geo::jittered_coords(&request.region, rng);

        Prospect {
            name: entry.name,
            site: entry.site,
            channel: "web".to_string(),
            category: request.industries.first().cloned().unwrap_or_default(),
            region: request.region.clone(),
            handle,
            has_qr: false,
            has_link: false,
            has_card: false,
            delivery: false,
            reviews: None,
            rating: None,
            followers: None,
            similarity_seed: SEED_SIMILARITY,
            lat,
            lon,
            similarity_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Mutex;

    fn request(region: &str) -> DiscoveryRequest {
        DiscoveryRequest {
            region: region.to_string(),
            industries: vec![],
            keywords: vec![],
        }
    }

    fn client(fetcher: Arc<dyn SearchFetcher>) -> DiscoveryClient {
        DiscoveryClient::new(DiscoveryConfig::default(), fetcher)
    }

    struct StubFetcher {
        html: String,
    }

    impl SearchFetcher for StubFetcher {
        fn fetch(&self, _target_url: &str) -> anyhow::Result<String> {
            Ok(self.html.clone())
        }
    }

    /// Fails on the first call, serves html afterwards.
    struct FlakyFetcher {
        html: String,
        calls: Mutex<usize>,
    }

    impl SearchFetcher for FlakyFetcher {
        fn fetch(&self, _target_url: &str) -> anyhow::Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Err(anyhow!("connection refused"))
            } else {
                Ok(self.html.clone())
            }
        }
    }

    fn result_html(sites: &[(&str, &str)]) -> String {
        let mut html = String::from("<html><body><ol>");
        for (name, site) in sites {
            html.push_str(&format!(
                r#"<li class="b_algo"><h2><a href="{site}">{name}</a></h2></li>"#
            ));
        }
        html.push_str("</ol></body></html>");
        html
    }

    #[test]
    fn queries_per_industry_and_keyword() {
        let mut config = DiscoveryConfig::default();
        config.max_sources = 10;
        let client = DiscoveryClient::new(config, Arc::new(StubFetcher { html: String::new() }));

        let queries = client.build_queries(&DiscoveryRequest {
            region: "Lima".to_string(),
            industries: vec!["retail".to_string()],
            keywords: vec!["pagos".to_string()],
        });

        assert_eq!(
            queries,
            vec![
                "retail Lima tienda directorio",
                "retail Lima negocios en línea",
                "pagos Lima negocio",
            ]
        );
    }

    #[test]
    fn queries_are_capped_at_max_sources() {
        let client = client(Arc::new(StubFetcher { html: String::new() }));
        let queries = client.build_queries(&DiscoveryRequest {
            region: "Lima".to_string(),
            industries: vec!["retail".to_string(), "farmacia".to_string()],
            keywords: vec!["pagos".to_string()],
        });
        assert_eq!(queries.len(), 3);
    }

    #[test]
    fn no_seeds_falls_back_to_generic_queries() {
        let client = client(Arc::new(StubFetcher { html: String::new() }));
        let queries = client.build_queries(&request("Trujillo"));
        assert!(!queries.is_empty());
        assert!(queries.iter().all(|q| q.contains("Trujillo")));
    }

    #[test]
    fn failing_source_contributes_zero_rows_without_propagating() {
        let html = result_html(&[("Bodega Sol", "https://sol.pe")]);
        let fetcher = FlakyFetcher {
            html,
            calls: Mutex::new(0),
        };
        let client = client(Arc::new(fetcher));

        let mut rng = StdRng::seed_from_u64(1);
        // two fallback queries: first fails, second yields the candidate
        let rows = client.discover(&request("Lima"), &mut rng);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].site, "https://sol.pe");
    }

    #[test]
    fn results_are_deduped_and_truncated() {
        let mut sites: Vec<(String, String)> = vec![];
        for i in 0..40 {
            sites.push((format!("Tienda {i}"), format!("https://t{i}.pe")));
        }
        // both fallback queries return the same 40 sites
        let pairs: Vec<(&str, &str)> = sites
            .iter()
            .map(|(n, s)| (n.as_str(), s.as_str()))
            .collect();

        let mut config = DiscoveryConfig::default();
        config.max_items = 25;
        let client = DiscoveryClient::new(
            config,
            Arc::new(StubFetcher {
                html: result_html(&pairs),
            }),
        );

        let mut rng = StdRng::seed_from_u64(2);
        let rows = client.discover(&request("Lima"), &mut rng);

        assert_eq!(rows.len(), 25);
        let mut seen = std::collections::HashSet::new();
        assert!(rows.iter().all(|p| seen.insert(p.site.clone())));
    }

    #[test]
    fn candidate_defaults() {
        let html = result_html(&[("Bodega Sol Y Mar", "https://sol.pe")]);
        let client = client(Arc::new(StubFetcher { html }));

        let mut rng = StdRng::seed_from_u64(3);
        let mut req = request("Cusco");
        req.industries = vec!["retail".to_string()];
        let rows = client.discover(&req, &mut rng);

        let p = &rows[0];
        assert_eq!(p.channel, "web");
        assert_eq!(p.category, "retail");
        assert_eq!(p.region, "Cusco");
        assert_eq!(p.handle, "@bodegasolymar");
        assert!(!p.has_qr && !p.has_link && !p.has_card && !p.delivery);
        assert_eq!(p.reviews, None);
        assert!((p.similarity_seed - 0.65).abs() < 1e-6);
        // Cusco is not in the coordinate table: Lima +- jitter
        assert!((p.lat - geo::LIMA.0).abs() <= geo::JITTER_DEGREES + 1e-9);
        assert!((p.lon - geo::LIMA.1).abs() <= geo::JITTER_DEGREES + 1e-9);
    }

    #[test]
    fn long_handles_are_truncated() {
        let name = "Tienda De Abarrotes Y Regalos Con Nombre Larguisimo";
        let html = result_html(&[(name, "https://larga.pe")]);
        let client = client(Arc::new(StubFetcher { html }));

        let mut rng = StdRng::seed_from_u64(4);
        let rows = client.discover(&request("Lima"), &mut rng);
        assert_eq!(rows[0].handle.chars().count(), 30);
        assert!(rows[0].handle.starts_with('@'));
    }
}
