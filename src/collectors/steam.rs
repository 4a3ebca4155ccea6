use crate::database_ops::db::Db;
use crate::database_ops::games::{self, GameUpsert};
use crate::database_ops::prices::{self, NewObservation};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::{stream, StreamExt};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

const APPDETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

#[derive(Debug, Deserialize)]
pub(crate) struct AppDetailsWrapper {
    pub(crate) success: bool,
    pub(crate) data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppData {
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) is_free: Option<bool>,
    #[serde(default)]
    pub(crate) short_description: Option<String>,
    #[serde(default)]
    pub(crate) header_image: Option<String>,
    pub(crate) price_overview: Option<PriceOverview>,
    pub(crate) metacritic: Option<Metacritic>,
    pub(crate) recommendations: Option<Recommendations>,
    pub(crate) genres: Option<Vec<GenreEntry>>, // {id, description}
    #[serde(default)]
    pub(crate) publishers: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) developers: Option<Vec<String>>,
    pub(crate) platforms: Option<PlatformFlags>,
    pub(crate) release_date: Option<ReleaseDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PriceOverview {
    pub(crate) currency: Option<String>,
    #[serde(rename = "initial")]
    pub(crate) initial_price: Option<i64>,
    #[serde(rename = "final")]
    pub(crate) final_price: Option<i64>,
    pub(crate) discount_percent: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Metacritic {
    pub(crate) score: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Recommendations {
    pub(crate) total: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenreEntry {
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PlatformFlags {
    #[serde(default)]
    pub(crate) windows: bool,
    #[serde(default)]
    pub(crate) mac: bool,
    #[serde(default)]
    pub(crate) linux: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReleaseDate {
    #[serde(default)]
    pub(crate) coming_soon: bool,
    pub(crate) date: Option<String>,
}

/// Steam prints release dates like "18 May, 2015". Unreleased or unparsable
/// dates stay None.
pub(crate) fn parse_release_date(release: Option<&ReleaseDate>) -> Option<NaiveDate> {
    let release = release?;
    if release.coming_soon {
        return None;
    }
    let raw = release.date.as_deref()?.trim();
    NaiveDate::parse_from_str(raw, "%d %b, %Y").ok()
}

#[derive(Debug, Default)]
pub struct CollectSummary {
    pub attempted: usize,
    pub priced: usize,
    pub metadata_only: usize,
    pub failed: usize,
}

enum Outcome {
    Priced,
    MetadataOnly,
    Failed,
}

/// Polls appdetails for tracked games and appends price observations.
/// Env: STEAM_COUNTRY (default us), STEAM_MAX_IN_FLIGHT, STEAM_MAX_RETRIES,
/// STEAM_BACKOFF_MS, STEAM_REQUEST_DELAY_MS.
pub struct SteamCollector {
    client: Client,
    country: String,
    max_in_flight: usize,
    max_retries: u32,
    backoff_base_ms: u64,
    request_delay_ms: u64,
}

impl SteamCollector {
    pub fn from_env() -> Result<Self> {
        use crate::util::env::{env_opt, env_parse};
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("steamwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            country: env_opt("STEAM_COUNTRY").unwrap_or_else(|| "us".to_string()),
            max_in_flight: env_parse("STEAM_MAX_IN_FLIGHT", 4usize),
            max_retries: env_parse("STEAM_MAX_RETRIES", 3u32),
            backoff_base_ms: env_parse("STEAM_BACKOFF_MS", 300u64),
            request_delay_ms: env_parse("STEAM_REQUEST_DELAY_MS", 250u64),
        })
    }

    /// Run one collection pass over `app_ids`.
    pub async fn collect(&self, db: &Db, app_ids: &[i64]) -> Result<CollectSummary> {
        info!(games = app_ids.len(), country = %self.country, "starting price collection pass");

        let outcomes: Vec<Outcome> = stream::iter(app_ids.iter().copied())
            .map(|app_id| self.collect_one(db, app_id))
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let mut summary = CollectSummary {
            attempted: app_ids.len(),
            ..CollectSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Priced => summary.priced += 1,
                Outcome::MetadataOnly => summary.metadata_only += 1,
                Outcome::Failed => summary.failed += 1,
            }
        }
        info!(
            priced = summary.priced,
            metadata_only = summary.metadata_only,
            failed = summary.failed,
            "collection pass complete"
        );
        Ok(summary)
    }

    async fn collect_one(&self, db: &Db, app_id: i64) -> Outcome {
        let data = match self.fetch_details(app_id).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                warn!(app_id, "no appdetails data available");
                return Outcome::Failed;
            }
            Err(e) => {
                warn!(app_id, error = %e, "appdetails fetch failed");
                return Outcome::Failed;
            }
        };

        let upsert = build_upsert(app_id, &data);
        if let Err(e) = games::upsert_game(db, &upsert).await {
            warn!(app_id, error = %e, "game upsert failed");
            return Outcome::Failed;
        }

        // Free-to-play games carry no price_overview; metadata still counts.
        let Some(observation) = build_observation(app_id, &data) else {
            return Outcome::MetadataOnly;
        };
        match prices::insert_observation(db, &observation).await {
            Ok(()) => {
                info!(
                    app_id,
                    final_minor = observation.final_minor,
                    discount = observation.discount_percent,
                    "observation recorded"
                );
                Outcome::Priced
            }
            Err(e) => {
                warn!(app_id, error = %e, "observation insert failed");
                Outcome::Failed
            }
        }
    }

    /// Fetch appdetails for one app with retry + exponential backoff.
    /// `Ok(None)` means the storefront answered but had nothing for this id.
    pub(crate) async fn fetch_details(&self, app_id: i64) -> Result<Option<AppData>> {
        let url = format!("{APPDETAILS_URL}?appids={app_id}&cc={}", self.country);
        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let jitter = rand::thread_rng().gen_range(0..100);
                let backoff = self.backoff_base_ms * (1 << (attempt - 1)) + jitter;
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            match self.try_fetch(&url, app_id).await {
                Ok(data) => {
                    if self.request_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.request_delay_ms)).await;
                    }
                    return Ok(data);
                }
                Err(e) => {
                    warn!(app_id, attempt, error = %e, "appdetails request failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("appdetails retries exhausted")))
    }

    async fn try_fetch(&self, url: &str, app_id: i64) -> Result<Option<AppData>> {
        let mut body: HashMap<String, AppDetailsWrapper> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let entry = body.remove(&app_id.to_string());
        Ok(entry.filter(|w| w.success).and_then(|w| w.data))
    }
}

fn build_upsert(app_id: i64, data: &AppData) -> GameUpsert {
    let platforms = data.platforms.as_ref();
    let genres = data
        .genres
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|g| g.description.as_deref())
        .map(|d| json!({ "description": d }))
        .collect::<Vec<_>>();
    GameUpsert {
        app_id,
        name: data.name.clone(),
        short_description: data.short_description.clone(),
        header_image_url: data.header_image.clone(),
        release_date: parse_release_date(data.release_date.as_ref()),
        metacritic_score: data.metacritic.as_ref().and_then(|m| m.score),
        recommendation_count: data.recommendations.as_ref().and_then(|r| r.total),
        platform_windows: platforms.map(|p| p.windows).unwrap_or(false),
        platform_mac: platforms.map(|p| p.mac).unwrap_or(false),
        platform_linux: platforms.map(|p| p.linux).unwrap_or(false),
        genres: json!(genres),
        publishers: json!(data.publishers.as_deref().unwrap_or_default()),
        developers: json!(data.developers.as_deref().unwrap_or_default()),
    }
}

fn build_observation(app_id: i64, data: &AppData) -> Option<NewObservation> {
    let overview = data.price_overview.as_ref()?;
    let final_minor = overview.final_price?;
    Some(NewObservation {
        app_id,
        currency: overview.currency.clone(),
        initial_minor: overview.initial_price.unwrap_or(final_minor),
        final_minor,
        discount_percent: overview.discount_percent.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "292030": {
            "success": true,
            "data": {
                "name": "The Witcher 3: Wild Hunt",
                "is_free": false,
                "short_description": "A story-driven open world RPG.",
                "header_image": "https://cdn.example/292030/header.jpg",
                "price_overview": {
                    "currency": "USD",
                    "initial": 3999,
                    "final": 999,
                    "discount_percent": 75
                },
                "metacritic": { "score": 92 },
                "recommendations": { "total": 512345 },
                "genres": [
                    { "id": "3", "description": "RPG" },
                    { "id": "25", "description": "Adventure" }
                ],
                "publishers": ["CD PROJEKT RED"],
                "developers": ["CD PROJEKT RED"],
                "platforms": { "windows": true, "mac": false, "linux": false },
                "release_date": { "coming_soon": false, "date": "18 May, 2015" }
            }
        }
    }"#;

    fn sample_data() -> AppData {
        let mut body: HashMap<String, AppDetailsWrapper> = serde_json::from_str(SAMPLE).unwrap();
        body.remove("292030").unwrap().data.unwrap()
    }

    #[test]
    fn appdetails_payload_deserializes() {
        let data = sample_data();
        assert_eq!(data.name.as_deref(), Some("The Witcher 3: Wild Hunt"));
        let overview = data.price_overview.as_ref().unwrap();
        assert_eq!(overview.final_price, Some(999));
        assert_eq!(overview.initial_price, Some(3999));
        assert_eq!(overview.discount_percent, Some(75));
    }

    #[test]
    fn upsert_carries_metadata_and_genre_objects() {
        let upsert = build_upsert(292030, &sample_data());
        assert_eq!(upsert.metacritic_score, Some(92));
        assert_eq!(upsert.recommendation_count, Some(512345));
        assert!(upsert.platform_windows);
        assert!(!upsert.platform_linux);
        assert_eq!(
            upsert.release_date,
            NaiveDate::from_ymd_opt(2015, 5, 18)
        );
        assert_eq!(
            upsert.genres,
            json!([{ "description": "RPG" }, { "description": "Adventure" }])
        );
        assert_eq!(upsert.publishers, json!(["CD PROJEKT RED"]));
    }

    #[test]
    fn observation_mirrors_price_overview() {
        let obs = build_observation(292030, &sample_data()).unwrap();
        assert_eq!(obs.final_minor, 999);
        assert_eq!(obs.initial_minor, 3999);
        assert_eq!(obs.discount_percent, 75);
        assert_eq!(obs.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn missing_price_overview_yields_no_observation() {
        let mut data = sample_data();
        data.price_overview = None;
        assert!(build_observation(292030, &data).is_none());
    }

    #[test]
    fn release_date_parsing() {
        let parsed = parse_release_date(Some(&ReleaseDate {
            coming_soon: false,
            date: Some("7 Nov, 2019".to_string()),
        }));
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2019, 11, 7));

        assert!(parse_release_date(Some(&ReleaseDate {
            coming_soon: true,
            date: Some("18 May, 2015".to_string()),
        }))
        .is_none());

        assert!(parse_release_date(Some(&ReleaseDate {
            coming_soon: false,
            date: Some("Coming soon".to_string()),
        }))
        .is_none());

        assert!(parse_release_date(None).is_none());
    }
}
