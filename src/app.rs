//! Application service: composes the client book, the prospect store,
//! scoring and discovery into the operations the endpoints expose.

use crate::{
    alerts::{self, Alert},
    clients::{Client, ClientBook, Segment},
    config::Config,
    corpus,
    discovery::{DiscoveryClient, DiscoveryRequest, ProxyFetcher, SearchFetcher},
    errors::AppError,
    prospects::{self, Prospect, ProspectStore},
    scoring::{
        blend_seed, min_max_scale, round_to, scale_by_max, EmbeddingModel, EmbeddingStrategy,
        Method, ScoringError, ScoringStrategy, TfidfStrategy,
    },
};
use chrono::Datelike;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

/// Threshold below which a client counts as having a frequency drop
const GROWTH_DROP: f32 = -0.2;
/// Clients selected for the best-client profile
const PROFILE_TOP_N: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RecentVisit {
    pub name: String,
    pub segment: Segment,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarteraStats {
    pub insight: usize,
    pub vistos_recientes: Vec<RecentVisit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RadarItem {
    pub name: String,
    pub handle: String,
    pub site: String,
    pub similarity_score: f32,
    pub category: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recorrido {
    pub visited: usize,
    pub target_total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardRecommendation {
    pub text: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub segments: BTreeMap<String, usize>,
    pub labels: BTreeMap<String, String>,
    pub churn_rate: f32,
    pub altas_mes: usize,
    pub nuevas_ventas: usize,
    pub recorrido: Recorrido,
    pub radar_top: Vec<RadarItem>,
    pub recommendations: Vec<DashboardRecommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Motivo {
    pub name: String,
    pub impact: u32,
}

/// Client row enriched with the mocked risk fields of the profile view.
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub risk_score: u32,
    pub risk_text: String,
    pub products_detail: Vec<String>,
    pub open_cases: u32,
    pub won_cases: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientProfileView {
    pub item: ClientDetail,
    pub motivos: Vec<Motivo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionRecommendation {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similar: Option<String>,
    pub cta: String,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshRequest {
    pub region: String,
    /// None falls back to the best-client profile industries
    pub industries: Option<Vec<String>>,
    /// None falls back to the best-client profile tag tokens
    pub keywords: Option<Vec<String>>,
    pub method: Method,
    pub limit: usize,
}

pub struct App {
    config: Config,
    clients: ClientBook,
    alerts: Vec<Alert>,
    prospects: ProspectStore,
    discovery: DiscoveryClient,
    embedder: Mutex<Option<Arc<EmbeddingModel>>>,
    cache_dir: PathBuf,
}

impl App {
    pub fn new(config: Config, data_dir: &str) -> anyhow::Result<Self> {
        let fetcher = Arc::new(ProxyFetcher::new(config.discovery.clone()));
        Self::with_fetcher(config, data_dir, fetcher)
    }

    pub fn with_fetcher(
        config: Config,
        data_dir: &str,
        fetcher: Arc<dyn SearchFetcher>,
    ) -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(data_dir);
        let clients = ClientBook::load(data_dir.join("clients.csv").to_str().unwrap())?;
        let alerts = alerts::load(data_dir.join("alerts.csv").to_str().unwrap())?;
        let prospects = ProspectStore::load(data_dir.join("prospects.csv").to_str().unwrap())?;
        let discovery = DiscoveryClient::new(config.discovery.clone(), fetcher);

        Ok(Self {
            config,
            clients,
            alerts,
            prospects,
            discovery,
            embedder: Mutex::new(None),
            cache_dir: data_dir,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn prospect_store(&self) -> &ProspectStore {
        &self.prospects
    }

    /// Segment filter compares normalized segments; an unknown segment
    /// value matches nothing.
    pub fn list_clients(&self, segment: Option<&str>) -> Vec<Client> {
        match segment {
            None => self.clients.all().to_vec(),
            Some(value) => match Segment::parse(value) {
                Ok(segment) => self
                    .clients
                    .by_segment(segment)
                    .into_iter()
                    .cloned()
                    .collect(),
                Err(_) => vec![],
            },
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn client_profile(&self, id: &str) -> Result<ClientProfileView, AppError> {
        let client = self.clients.get(id).ok_or(AppError::NotFound)?;

        let risk_score = if client.segment == Segment::Riesgo { 32 } else { 12 };
        let risk_text = if risk_score >= 30 {
            "Riesgo de fuga"
        } else {
            "Riesgo bajo"
        };

        let mut motivos = vec![];
        if client.avg_tx_growth < GROWTH_DROP {
            motivos.push(Motivo {
                name: "Caída de frecuencia".to_string(),
                impact: 52,
            });
        }
        if client.nps_last <= 6 {
            motivos.push(Motivo {
                name: "NPS bajo".to_string(),
                impact: 30,
            });
        }
        motivos.push(Motivo {
            name: "Ventas".to_string(),
            impact: 18,
        });

        Ok(ClientProfileView {
            item: ClientDetail {
                client: client.clone(),
                risk_score,
                risk_text: risk_text.to_string(),
                products_detail: client.products_detail(),
                open_cases: 3,
                won_cases: 1,
            },
            motivos,
        })
    }

    pub fn recommend_actions(&self, id: &str) -> Result<Vec<ActionRecommendation>, AppError> {
        let client = self.clients.get(id).ok_or(AppError::NotFound)?;

        let recs = if client.segment == Segment::Riesgo || client.avg_tx_growth < GROWTH_DROP {
            vec![
                ActionRecommendation {
                    title: "Enviar WhatsApp de winback".to_string(),
                    similar: Some("48 clientes".to_string()),
                    cta: "Programar".to_string(),
                },
                ActionRecommendation {
                    title: "Ofrecer cupón de reactivación (ticket > S/50)".to_string(),
                    similar: None,
                    cta: "Generar cupón".to_string(),
                },
            ]
        } else {
            vec![ActionRecommendation {
                title: "Upsell de combos".to_string(),
                similar: None,
                cta: "WhatsApp".to_string(),
            }]
        };

        Ok(recs)
    }

    pub fn stats_cartera(&self) -> CarteraStats {
        let insight = self
            .clients
            .count_where(|c| c.avg_tx_growth < GROWTH_DROP)
            + 2;

        let mut recent: Vec<&Client> = self.clients.all().iter().collect();
        recent.sort_by(|a, b| b.last_visit_date.cmp(&a.last_visit_date));

        CarteraStats {
            insight,
            vistos_recientes: recent
                .into_iter()
                .take(3)
                .map(|c| RecentVisit {
                    name: c.name.clone(),
                    segment: c.segment,
                })
                .collect(),
        }
    }

    pub fn stats_dashboard(&self) -> Result<DashboardStats, AppError> {
        let clients = self.clients.all();

        let mut segments = BTreeMap::new();
        for client in clients {
            *segments.entry(client.segment.as_str().to_string()).or_insert(0) += 1;
        }

        let labels = Segment::all()
            .iter()
            .map(|s| (s.as_str().to_string(), s.label().to_string()))
            .collect();

        let inactive = self.clients.count_where(|c| c.segment == Segment::Inactivo);
        let churn_rate = inactive as f32 / self.clients.len().max(1) as f32 * 0.68;
        let churn_rate = (churn_rate * 1000.0).round() / 1000.0;

        let altas_mes = self.clients.count_where(|c| c.months_active <= 1) + 210;
        let nuevas_ventas = self.clients.count_where(|c| c.avg_tx_growth > 0.0) * 100 + 240;

        let this_month = chrono::Utc::now().date_naive().month();
        let visited = self
            .clients
            .count_where(|c| c.last_visit_date.month() == this_month)
            + 175;

        // radar: every prospect scored against the client corpus,
        // bounded tf-idf vocabulary, rounded to whole points
        let all_prospects = self.prospects.snapshot();
        let texts: Vec<String> = all_prospects.iter().map(prospects::prospect_text).collect();
        let seeds: Vec<f32> = all_prospects.iter().map(|p| p.similarity_seed).collect();

        let mut strategy = TfidfStrategy::new(self.config.scoring.radar_max_terms);
        strategy.fit(&corpus::client_corpus(clients))?;
        let raw = strategy.score(&texts)?;
        let scores = round_to(&scale_by_max(&blend_seed(&raw, &seeds)), 0);

        let mut ranked: Vec<(&Prospect, f32)> =
            all_prospects.iter().zip(scores.iter().cloned()).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let radar_top = ranked
            .iter()
            .take(3)
            .map(|(p, score)| RadarItem {
                name: p.name.clone(),
                handle: p.handle.clone(),
                site: p.site.clone(),
                similarity_score: *score,
                category: p.category.clone(),
            })
            .collect();

        let caida_freq = self.clients.count_where(|c| c.avg_tx_growth < GROWTH_DROP) + 10;
        let alto_potencial = scores.iter().filter(|s| **s >= 75.0).count();
        let nps_bajo = self.clients.count_where(|c| c.nps_last <= 6) + 4;

        let recommendations = vec![
            DashboardRecommendation {
                text: format!("{caida_freq} clientes con caída de frecuencia"),
                action: "Ver".to_string(),
            },
            DashboardRecommendation {
                text: format!("{alto_potencial} nuevos clientes de alto potencial"),
                action: "Explorar".to_string(),
            },
            DashboardRecommendation {
                text: format!("{nps_bajo} clientes con NPS bajo"),
                action: "Actuar".to_string(),
            },
        ];

        Ok(DashboardStats {
            segments,
            labels,
            churn_rate,
            altas_mes,
            nuevas_ventas,
            recorrido: Recorrido {
                visited,
                target_total: 450,
            },
            radar_top,
            recommendations,
        })
    }

    /// Score the stored prospects of a region against the full client
    /// corpus. Seed blending happens before scaling; scaling divides by
    /// the max only (the refresh path uses a full min-max instead).
    pub fn search_prospects(
        &self,
        region: &str,
        limit: usize,
        method: Method,
    ) -> Result<Vec<Prospect>, AppError> {
        let mut candidates = self.prospects.snapshot();
        if !region.is_empty() {
            let region = region.to_lowercase();
            candidates.retain(|p| p.region.to_lowercase() == region);
        }

        let texts: Vec<String> = candidates.iter().map(prospects::prospect_text).collect();
        let seeds: Vec<f32> = candidates.iter().map(|p| p.similarity_seed).collect();

        let mut strategy = self.strategy(method, self.config.scoring.search_max_terms)?;
        strategy.fit(&corpus::client_corpus(self.clients.all()))?;
        let raw = strategy.score(&texts)?;

        let scores = round_to(&scale_by_max(&blend_seed(&raw, &seeds)), 1);
        for (prospect, score) in candidates.iter_mut().zip(scores) {
            prospect.similarity_score = score;
        }

        candidates.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(limit);

        Ok(candidates)
    }

    /// Discovery + merge + rescore + persist. Industries and keywords
    /// default to the best-client profile; the profile texts are the
    /// base corpus for rescoring.
    pub fn refresh_prospects(&self, request: RefreshRequest) -> Result<Vec<Prospect>, AppError> {
        let profile = corpus::best_client_profile(self.clients.all(), PROFILE_TOP_N);

        let discovery_request = DiscoveryRequest {
            region: request.region.clone(),
            industries: request
                .industries
                .unwrap_or_else(|| profile.top_industries.clone()),
            keywords: request.keywords.unwrap_or_else(|| profile.top_tags.clone()),
        };

        let mut rng = StdRng::from_os_rng();
        let discovered = self.discovery.discover(&discovery_request, &mut rng);
        log::info!(
            "discovery for {:?} yielded {} candidates",
            request.region,
            discovered.len()
        );

        let mut strategy = self.strategy(request.method, self.config.scoring.search_max_terms)?;
        strategy.fit(&profile.texts)?;

        let merged = self.prospects.merge_and_store(discovered, |rows| {
            let texts: Vec<String> = rows.iter().map(prospects::prospect_text).collect();
            let seeds: Vec<f32> = rows.iter().map(|p| p.similarity_seed).collect();
            let raw = strategy.score(&texts)?;
            Ok(round_to(&min_max_scale(&blend_seed(&raw, &seeds)), 1))
        })?;

        Ok(prospects::region_view(&merged, &request.region, request.limit))
    }

    fn strategy(
        &self,
        method: Method,
        max_terms: usize,
    ) -> Result<Box<dyn ScoringStrategy>, AppError> {
        match method {
            Method::Tfidf => Ok(Box::new(TfidfStrategy::new(max_terms))),
            Method::Embedding => Ok(Box::new(EmbeddingStrategy::new(self.embedder()?))),
        }
    }

    /// Lazy embedding model init; the first embedding-method request
    /// pays the model download.
    fn embedder(&self) -> Result<Arc<EmbeddingModel>, ScoringError> {
        let mut guard = self.embedder.lock().expect("embedder lock poisoned");
        if guard.is_none() {
            let model = EmbeddingModel::new(
                &self.config.scoring.embedding_model,
                self.cache_dir.clone(),
            )?;
            *guard = Some(Arc::new(model));
        }
        Ok(guard.as_ref().expect("just initialized").clone())
    }
}
