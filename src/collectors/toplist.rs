use crate::database_ops::db::Db;
use crate::database_ops::{games, tracking};
use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

const TOP_SELLERS_URL: &str = "https://store.steampowered.com/search/?filter=topsellers&page=";
const TRACK_SOURCE: &str = "top_sellers";

fn appid_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"data-ds-appid="(\d+)""#).unwrap())
}

/// Pull app ids out of one search-results page, in page order.
fn extract_app_ids(html: &str) -> Vec<i64> {
    appid_pattern()
        .captures_iter(html)
        .filter_map(|cap| cap[1].parse().ok())
        .collect()
}

/// Dedupe preserving first-seen order.
fn dedupe_ordered(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    pub discovered: usize,
    pub added: usize,
    pub already_tracked: usize,
    pub skipped_free: usize,
    pub failed: usize,
}

/// Walks the top-sellers search pages and keeps the tracked-games list
/// current. Paid games get tracked; free-to-play titles are skipped since
/// they have no price history worth recording.
pub struct ToplistSync {
    client: Client,
    max_pages: u32,
    page_delay: Duration,
    check_delay: Duration,
}

impl ToplistSync {
    pub fn new(max_pages: u32) -> Result<Self> {
        use crate::util::env::env_parse;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("steamwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building http client")?;
        Ok(Self {
            client,
            max_pages,
            page_delay: Duration::from_millis(env_parse("TOPLIST_PAGE_DELAY_MS", 1000u64)),
            check_delay: Duration::from_millis(env_parse("TOPLIST_CHECK_DELAY_MS", 1500u64)),
        })
    }

    /// Scrape up to `max_pages` of top sellers; stops early on an empty page.
    pub async fn scrape_top_app_ids(&self) -> Result<Vec<i64>> {
        let mut all_ids = Vec::new();
        for page in 1..=self.max_pages {
            let url = format!("{TOP_SELLERS_URL}{page}");
            let html = match self.fetch_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(page, error = %e, "top sellers page fetch failed");
                    continue;
                }
            };
            let page_ids = extract_app_ids(&html);
            if page_ids.is_empty() {
                info!(page, "no games found, stopping page walk");
                break;
            }
            info!(page, found = page_ids.len(), "scraped top sellers page");
            all_ids.extend(page_ids);
            tokio::time::sleep(self.page_delay).await;
        }
        let unique = dedupe_ordered(all_ids);
        info!(unique = unique.len(), "page walk complete");
        Ok(unique)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html)
    }

    /// Reconcile scraped ids against the tracking table.
    pub async fn sync(&self, db: &Db, collector: &super::steam::SteamCollector) -> Result<SyncSummary> {
        let app_ids = self.scrape_top_app_ids().await?;
        let mut summary = SyncSummary {
            discovered: app_ids.len(),
            ..SyncSummary::default()
        };

        for app_id in app_ids {
            if tracking::is_tracked(db, app_id).await? {
                tracking::touch_last_seen(db, app_id).await?;
                summary.already_tracked += 1;
                continue;
            }

            let details = match collector.fetch_details(app_id).await {
                Ok(Some(details)) => details,
                Ok(None) => {
                    summary.failed += 1;
                    continue;
                }
                Err(e) => {
                    warn!(app_id, error = %e, "appdetails check failed");
                    summary.failed += 1;
                    continue;
                }
            };

            let name = details.name.as_deref().unwrap_or("Unknown");
            if details.is_free.unwrap_or(false) {
                info!(app_id, name, "skipping free-to-play title");
                summary.skipped_free += 1;
                continue;
            }

            tracking::insert_tracked(db, app_id, TRACK_SOURCE, false).await?;
            games::upsert_game_stub(db, app_id, name).await?;
            info!(app_id, name, "now tracking");
            summary.added += 1;

            tokio::time::sleep(self.check_delay).await;
        }

        info!(
            discovered = summary.discovered,
            added = summary.added,
            already_tracked = summary.already_tracked,
            skipped_free = summary.skipped_free,
            failed = summary.failed,
            "tracked-games sync complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_app_ids_in_page_order() {
        let html = r#"
            <a href="https://store.steampowered.com/app/292030/" class="search_result_row" data-ds-appid="292030">
            <a href="https://store.steampowered.com/app/1091500/" class="search_result_row" data-ds-appid="1091500">
            <a href="https://store.steampowered.com/app/730/" class="search_result_row" data-ds-appid="730">
        "#;
        assert_eq!(extract_app_ids(html), vec![292030, 1091500, 730]);
    }

    #[test]
    fn pages_without_results_extract_nothing() {
        assert!(extract_app_ids("<html><body>No results</body></html>").is_empty());
    }

    #[test]
    fn dedupe_keeps_first_occurrence_order() {
        assert_eq!(
            dedupe_ordered(vec![730, 570, 730, 292030, 570]),
            vec![730, 570, 292030]
        );
    }
}
