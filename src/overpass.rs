//! Overpass API client for candidate POIs.
//!
//! This module provides:
//! - Category queries over a route's bounding box
//! - Secondary resolution of `way` elements into a single coordinate
//! - Dispatch spacing and retry with exponential backoff on 429/504
//! - The end-to-end pipeline from route samples to matched POIs

use crate::candidate::{Candidate, ElementKind};
use crate::category::PoiCategory;
use crate::error::{OptionExt, Result, RoutePoiError};
use crate::geo_utils::{expand_bounds, polyline_length_km};
use crate::matcher::{MatchConfig, PoiMatch, PoiMatcher};
use crate::route_index::RouteIndex;
use crate::{Bounds, GpsPoint};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use futures::future::{self, Future};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Public Overpass instance.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

// The public instance hands out a couple of slots per client; keep request
// starts spaced and only a few in flight.
const DISPATCH_INTERVAL_MS: u64 = 250;
const MAX_CONCURRENCY: usize = 2;
const MAX_RETRIES: u32 = 3;
const QUERY_TIMEOUT_SECS: u32 = 60;

/// Matches found for one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryMatches {
    pub category: PoiCategory,
    pub matches: Vec<PoiMatch>,
    /// Candidates returned by the query
    pub candidate_count: usize,
    /// Candidates skipped because their way could not be resolved
    pub unresolved_count: usize,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

/// A raw Overpass element. Relations and anything else are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node { id: i64, lat: f64, lon: f64 },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
    },
    #[serde(other)]
    Other,
}

fn parse_elements(body: &[u8]) -> Result<Vec<Element>> {
    let response: OverpassResponse =
        serde_json::from_slice(body).map_err(|e| RoutePoiError::InvalidResponse {
            message: format!("JSON parse error: {}", e),
        })?;
    Ok(response.elements)
}

/// Coordinate of the first node of `way_id`, as found in a `(._;>;)` response.
fn first_node_location(elements: &[Element], way_id: i64) -> Result<GpsPoint> {
    let first_node = elements
        .iter()
        .find_map(|e| match e {
            Element::Way { id, nodes } if *id == way_id => nodes.first().copied(),
            _ => None,
        })
        .ok_or_unresolved(way_id, "way not found or has no nodes")?;

    elements
        .iter()
        .find_map(|e| match e {
            Element::Node { id, lat, lon } if *id == first_node => {
                Some(GpsPoint::new(*lat, *lon))
            }
            _ => None,
        })
        .ok_or_unresolved(way_id, "first node missing from response")
}

/// Turn response elements into candidates, in response order.
///
/// Ways go through `resolve` at most `MAX_CONCURRENCY` at a time; a failed
/// lookup yields an unresolved candidate.
async fn candidates_from_elements<F, Fut>(
    elements: Vec<Element>,
    category: PoiCategory,
    resolve: F,
) -> Vec<Candidate>
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = Result<GpsPoint>>,
{
    let resolve = &resolve;

    stream::iter(elements)
        .map(|element| async move {
            let candidate = match element {
                Element::Node { id, lat, lon } => Candidate::node(id, GpsPoint::new(lat, lon)),
                Element::Way { id, .. } => match resolve(id).await {
                    Ok(location) => Candidate::way(id, location),
                    Err(e) => {
                        warn!("[Overpass] Failed to resolve way {}: {}", id, e);
                        Candidate::unresolved(Some(id), ElementKind::Way, e.to_string())
                    }
                },
                Element::Other => return None,
            };
            Some(candidate.with_category(category))
        })
        .buffered(MAX_CONCURRENCY)
        .filter_map(future::ready)
        .collect()
        .await
}

/// Spaces out when requests start and tracks consecutive rate-limit hits.
struct DispatchRateLimiter {
    next_dispatch: Mutex<Instant>,
    dispatched_count: AtomicU32,
    consecutive_throttles: AtomicU32,
}

impl DispatchRateLimiter {
    fn new() -> Self {
        Self {
            next_dispatch: Mutex::new(Instant::now()),
            dispatched_count: AtomicU32::new(0),
            consecutive_throttles: AtomicU32::new(0),
        }
    }

    /// Wait for our dispatch slot. Each caller gets a unique slot
    /// spaced DISPATCH_INTERVAL_MS apart.
    async fn wait_for_dispatch_slot(&self) -> u32 {
        let (wait_duration, dispatch_num) = {
            let mut next = self.next_dispatch.lock().await;
            let now = Instant::now();
            let dispatch_at = if *next > now { *next } else { now };
            *next = dispatch_at + Duration::from_millis(DISPATCH_INTERVAL_MS);

            let num = self.dispatched_count.fetch_add(1, Ordering::Relaxed) + 1;
            (dispatch_at.saturating_duration_since(now), num)
        };

        // Wait outside the lock
        if wait_duration > Duration::from_millis(5) {
            debug!("[Dispatch #{}] Waiting {:?} for slot", dispatch_num, wait_duration);
            tokio::time::sleep(wait_duration).await;
        }

        dispatch_num
    }

    fn record_success(&self) {
        self.consecutive_throttles.store(0, Ordering::Relaxed);
    }

    fn record_throttle(&self) -> Duration {
        let count = self.consecutive_throttles.fetch_add(1, Ordering::Relaxed) + 1;
        // Exponential backoff: 2s, 4s, 8s, 16s max
        let backoff = Duration::from_millis(1000 * (1 << count.min(4)));
        warn!(
            "[DispatchRateLimiter] Overpass throttled us, consecutive: {}, backing off {:?}",
            count, backoff
        );
        backoff
    }
}

/// Async client for an Overpass API instance.
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    rate_limiter: Arc<DispatchRateLimiter>,
}

impl OverpassClient {
    /// Client for the public Overpass instance.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Client for a custom Overpass interpreter URL.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("route-poi/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS as u64 + 15))
            .build()
            .map_err(|e| RoutePoiError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            rate_limiter: Arc::new(DispatchRateLimiter::new()),
        })
    }

    /// Fetch the candidates of one category inside `bounds`.
    ///
    /// Nodes become point candidates. Ways are resolved to their first node;
    /// ways that fail to resolve are returned as unresolved candidates.
    pub async fn query_candidates(
        &self,
        bounds: &Bounds,
        category: PoiCategory,
    ) -> Result<Vec<Candidate>> {
        let start = Instant::now();
        let ql = category.overpass_ql(bounds, QUERY_TIMEOUT_SECS);
        let elements = parse_elements(&self.run_query(&ql).await?)?;

        debug!(
            "[Overpass] {}: {} nodes, {} ways to resolve",
            category,
            elements.iter().filter(|e| matches!(e, Element::Node { .. })).count(),
            elements.iter().filter(|e| matches!(e, Element::Way { .. })).count()
        );

        let candidates =
            candidates_from_elements(elements, category, move |way_id| self.resolve_way(way_id))
                .await;

        info!(
            "[Overpass] {}: {} candidates in {:.2}s",
            category,
            candidates.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(candidates)
    }

    /// Reduce a way to the coordinate of its first node.
    pub async fn resolve_way(&self, way_id: i64) -> Result<GpsPoint> {
        let ql = format!(
            "[out:json][timeout:{}];way({});(._;>;);out body;",
            QUERY_TIMEOUT_SECS, way_id
        );
        let body = self.run_query(&ql).await?;
        first_node_location(&parse_elements(&body)?, way_id)
    }

    /// POST a query, retrying when the server is busy.
    async fn run_query(&self, ql: &str) -> Result<Vec<u8>> {
        let mut retries = 0;

        loop {
            let dispatch_num = self.rate_limiter.wait_for_dispatch_slot().await;
            let req_start = Instant::now();

            let response = self
                .client
                .post(&self.endpoint)
                .form(&[("data", ql)])
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::GATEWAY_TIMEOUT
                    {
                        retries += 1;
                        if retries > MAX_RETRIES {
                            return Err(RoutePoiError::Http {
                                message: "Max retries exceeded".to_string(),
                                status_code: Some(status.as_u16()),
                            });
                        }
                        let wait = self.rate_limiter.record_throttle();
                        warn!(
                            "[Overpass #{}] {} after {:?}, retry {} with {:?} backoff",
                            dispatch_num,
                            status,
                            req_start.elapsed(),
                            retries,
                            wait
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    self.rate_limiter.record_success();

                    if !status.is_success() {
                        return Err(RoutePoiError::Http {
                            message: format!("Overpass returned {}", status),
                            status_code: Some(status.as_u16()),
                        });
                    }

                    let bytes = resp.bytes().await.map_err(|e| RoutePoiError::Http {
                        message: format!("Body download error: {}", e),
                        status_code: None,
                    })?;

                    debug!(
                        "[Overpass #{}] {:.1}KB in {:?}",
                        dispatch_num,
                        bytes.len() as f64 / 1024.0,
                        req_start.elapsed()
                    );

                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(RoutePoiError::Http {
                            message: format!("Request error: {}", e),
                            status_code: None,
                        });
                    }

                    let wait = Duration::from_millis(500 * (1 << retries));
                    warn!(
                        "[Overpass #{}] Error: {}, retry {} after {:?}",
                        dispatch_num, e, retries, wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Find POIs of each category along a route.
///
/// Builds the route index once, queries every category over the route's
/// (optionally padded) bounding box and matches the results. An empty route
/// returns no results without touching the network.
pub async fn find_route_pois(
    client: &OverpassClient,
    route: Vec<GpsPoint>,
    categories: &[PoiCategory],
    config: &MatchConfig,
) -> Result<Vec<CategoryMatches>> {
    let start = Instant::now();
    let route_km = polyline_length_km(&route);
    let index = RouteIndex::build_with(route, &config.split_planner());

    let Some(bounds) = index.bounds() else {
        info!("[Overpass] Empty route, skipping {} categories", categories.len());
        return Ok(Vec::new());
    };
    let bounds = expand_bounds(&bounds, config.bbox_padding_km);

    info!(
        "[Overpass] Route: {} samples, {:.1}km, {} buckets",
        index.len(),
        route_km,
        index.num_buckets()
    );

    let matcher = PoiMatcher::new(&index, config.clone());
    let mut outcomes = Vec::with_capacity(categories.len());

    for &category in categories {
        let outcome = client
            .query_candidates(&bounds, category)
            .await
            .map(|candidates| {
                let unresolved_count = candidates.iter().filter(|c| !c.is_resolved()).count();

                #[cfg(feature = "parallel")]
                let matches = matcher.match_candidates_parallel(&candidates);

                #[cfg(not(feature = "parallel"))]
                let matches = matcher.match_candidates(&candidates);

                CategoryMatches {
                    category,
                    matches,
                    candidate_count: candidates.len(),
                    unresolved_count,
                }
            });
        outcomes.push((category, outcome));
    }

    let results = collect_category_results(outcomes)?;

    info!(
        "[Overpass] {} categories, {} POIs on route in {:.2}s",
        results.len(),
        results.iter().map(|r| r.matches.len()).sum::<usize>(),
        start.elapsed().as_secs_f64()
    );

    Ok(results)
}

/// Keep the categories that succeeded; a failed category is logged and left
/// out. Fails only when every category failed.
fn collect_category_results(
    outcomes: Vec<(PoiCategory, Result<CategoryMatches>)>,
) -> Result<Vec<CategoryMatches>> {
    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_error = None;

    for (category, outcome) in outcomes {
        match outcome {
            Ok(matches) => results.push(matches),
            Err(e) => {
                warn!("[Overpass] {} query failed, skipping: {}", category, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if results.is_empty() => Err(e),
        _ => Ok(results),
    }
}

/// Synchronous wrapper around [`find_route_pois`] on a dedicated tokio runtime.
pub fn find_route_pois_blocking(
    route: Vec<GpsPoint>,
    categories: &[PoiCategory],
    config: &MatchConfig,
) -> Result<Vec<CategoryMatches>> {
    use tokio::runtime::Builder;

    let rt = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| RoutePoiError::Config {
            message: format!("Failed to create tokio runtime: {}", e),
        })?;

    let client = OverpassClient::new()?;
    rt.block_on(find_route_pois(&client, route, categories, config))
}
