// surfsup - Read-only HTTP API for Hawaii climate observations
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::metrics::{encode_text, RequestMetrics, OPENMETRICS_TEXT};
use crate::store::{parse_date, ClimateStore, DailyValue, Station, StoreError, TemperatureStats};
use axum::extract::{MatchedPath, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Days, NaiveDate};
use prometheus_client::registry::Registry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const WELCOME: &str = "Welcome to the Hawaii Climate Analysis API!
Available Routes:
/api/v1.0/precipitation
/api/v1.0/stations
/api/v1.0/tobs
/api/v1.0/<start> (enter as YYYY-MM-DD)
/api/v1.0/<start>/<end> (enter as YYYY-MM-DD/YYYY-MM-DD)
";

/// Length of the trailing window used by the precipitation and tobs routes.
const LAST_YEAR: Days = Days::new(365);

/// Errors returned to API clients as a JSON body of the form `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Store(e) => {
                tracing::error!(message = "failed to query climate data", error = %e);
                (StatusCode::INTERNAL_SERVER_ERROR, "unable to query climate data".to_owned())
            }
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

/// State shared by every request handler.
#[derive(Debug)]
pub struct RequestContext {
    store: ClimateStore,
    registry: Registry,
    metrics: RequestMetrics,
}

impl RequestContext {
    /// Create a new context, registering request metrics with the provided `Registry`.
    pub fn new(store: ClimateStore, mut registry: Registry) -> Self {
        let metrics = RequestMetrics::new(&mut registry);
        RequestContext {
            store,
            registry,
            metrics,
        }
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }
}

/// Build the router for every API route, the route listing, and `/metrics`.
pub fn router(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api/v1.0/precipitation", get(precipitation))
        .route("/api/v1.0/stations", get(stations))
        .route("/api/v1.0/tobs", get(tobs))
        .route("/api/v1.0/:start", get(temperature_since))
        .route("/api/v1.0/:start/:end", get(temperature_between))
        .route("/metrics", get(text_metrics))
        .route_layer(middleware::from_fn_with_state(context.clone(), track_requests))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn track_requests<B>(State(context): State<Arc<RequestContext>>, req: Request<B>, next: Next<B>) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let res = next.run(req).await;
    context.metrics.request(&route, res.status().as_u16());
    res
}

async fn welcome() -> &'static str {
    WELCOME
}

async fn precipitation(State(context): State<Arc<RequestContext>>) -> Result<Json<BTreeMap<String, Option<f64>>>, ApiError> {
    let values = match last_year(&context.store).await? {
        Some(since) => context.store.precipitation_since(since).await?,
        None => Vec::new(),
    };

    Ok(Json(by_date(values)))
}

async fn stations(State(context): State<Arc<RequestContext>>) -> Result<Json<Vec<Station>>, ApiError> {
    Ok(Json(context.store.all_stations().await?))
}

async fn tobs(State(context): State<Arc<RequestContext>>) -> Result<Json<BTreeMap<String, Option<f64>>>, ApiError> {
    let since = match last_year(&context.store).await? {
        Some(d) => d,
        None => return Ok(Json(BTreeMap::new())),
    };

    let active = match context.store.most_active_station().await? {
        Some(a) => a,
        None => return Ok(Json(BTreeMap::new())),
    };

    tracing::debug!(
        message = "selected most active station",
        station = %active.station,
        measurements = active.count,
        since = %since,
    );

    let values = context.store.observations_for_station(&active.station, since).await?;
    Ok(Json(by_date(values)))
}

async fn temperature_since(
    State(context): State<Arc<RequestContext>>,
    Path(start): Path<String>,
) -> Result<Json<Vec<TemperatureStats>>, ApiError> {
    let start = date_param("start", &start)?;
    let stats = context.store.temperature_stats(start, None).await?;
    Ok(Json(vec![stats]))
}

async fn temperature_between(
    State(context): State<Arc<RequestContext>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<Vec<TemperatureStats>>, ApiError> {
    let start = date_param("start", &start)?;
    let end = date_param("end", &end)?;
    let stats = context.store.temperature_stats(start, Some(end)).await?;
    Ok(Json(vec![stats]))
}

async fn text_metrics(State(context): State<Arc<RequestContext>>) -> Response {
    match encode_text(&context.registry) {
        Ok(buf) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            ([(CONTENT_TYPE, OPENMETRICS_TEXT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

/// Start of the year leading up to the most recent measurement, if there are any.
async fn last_year(store: &ClimateStore) -> Result<Option<NaiveDate>, StoreError> {
    Ok(store
        .latest_date()
        .await?
        .map(|latest| latest.checked_sub_days(LAST_YEAR).unwrap_or(NaiveDate::MIN)))
}

fn date_param(name: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    parse_date(raw).ok_or_else(|| ApiError::Validation(format!("invalid {} date '{}', expected YYYY-MM-DD", name, raw)))
}

/// Collapse values into a map keyed by date. When several values share a date,
/// the last one wins.
fn by_date(values: Vec<DailyValue>) -> BTreeMap<String, Option<f64>> {
    values.into_iter().map(|v| (v.date, v.value)).collect()
}
