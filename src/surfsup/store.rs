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

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Format used for every date stored in, and bound into queries against, the store.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed date {0} in store")]
    MalformedDate(String),
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Format a date the way the `measurement` table stores it, so that string
/// comparison in SQL matches calendar order.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Row of the `station` table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Station {
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

/// Row of the `measurement` table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Measurement {
    pub station: String,
    pub date: String,
    pub prcp: Option<f64>,
    pub tobs: Option<f64>,
}

/// A single value observed on a given date. `value` is `None` when the
/// observation was not recorded.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DailyValue {
    pub date: String,
    pub value: Option<f64>,
}

/// Aggregate temperature over a date range. All fields are `None` when no
/// rows fall inside the range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureStats {
    pub tmin: Option<f64>,
    pub tavg: Option<f64>,
    pub tmax: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StationActivity {
    pub station: String,
    pub count: i64,
}

/// Row counts and date coverage reported after verifying the store at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummary {
    pub stations: i64,
    pub measurements: i64,
    pub latest: Option<NaiveDate>,
}

/// Read-only query layer over the `station` and `measurement` tables.
///
/// Cloning is cheap: all clones share the same connection pool and each query
/// acquires its own connection for the duration of the query.
#[derive(Debug, Clone)]
pub struct ClimateStore {
    pool: SqlitePool,
}

impl ClimateStore {
    pub fn new(pool: SqlitePool) -> Self {
        ClimateStore { pool }
    }

    /// Open a read-only pool of connections to the SQLite database at `url`.
    pub async fn connect(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?.read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_with(opts)
            .await?;

        Ok(Self::new(pool))
    }

    /// Make sure both tables exist with the columns we expect by decoding a row
    /// from each, and report how much data is available.
    pub async fn verify(&self) -> Result<StoreSummary, StoreError> {
        let station = sqlx::query_as::<_, Station>(
            "SELECT station, name, latitude, longitude, elevation FROM station LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        tracing::debug!(message = "decoded sample station", station = ?station);

        let measurement =
            sqlx::query_as::<_, Measurement>("SELECT station, date, prcp, tobs FROM measurement LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;
        tracing::debug!(message = "decoded sample measurement", measurement = ?measurement);

        let stations = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM station")
            .fetch_one(&self.pool)
            .await?;
        let measurements = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM measurement")
            .fetch_one(&self.pool)
            .await?;
        let latest = self.latest_date().await?;

        Ok(StoreSummary {
            stations,
            measurements,
            latest,
        })
    }

    /// Most recent observation date of any measurement, `None` if there are none.
    pub async fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        let latest = sqlx::query_scalar::<_, Option<String>>("SELECT MAX(date) FROM measurement")
            .fetch_one(&self.pool)
            .await?;

        match latest {
            Some(s) => parse_date(&s).map(Some).ok_or(StoreError::MalformedDate(s)),
            None => Ok(None),
        }
    }

    /// Min, average, and max temperature of all measurements on or after `start` and,
    /// if given, on or before `end`.
    pub async fn temperature_stats(&self, start: NaiveDate, end: Option<NaiveDate>) -> Result<TemperatureStats, StoreError> {
        let (tmin, tavg, tmax) = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>)>(
            "SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement \
             WHERE date >= ?1 AND (?2 IS NULL OR date <= ?2)",
        )
        .bind(format_date(start))
        .bind(end.map(format_date))
        .fetch_one(&self.pool)
        .await?;

        Ok(TemperatureStats { tmin, tavg, tmax })
    }

    /// Precipitation of every measurement on or after `since`, ordered by date and
    /// then by station so that rows sharing a date always come back in the same order.
    pub async fn precipitation_since(&self, since: NaiveDate) -> Result<Vec<DailyValue>, StoreError> {
        Ok(sqlx::query_as::<_, DailyValue>(
            "SELECT date, prcp AS value FROM measurement WHERE date >= ?1 ORDER BY date, station",
        )
        .bind(format_date(since))
        .fetch_all(&self.pool)
        .await?)
    }

    /// Every station, in the order the store keeps them.
    pub async fn all_stations(&self) -> Result<Vec<Station>, StoreError> {
        Ok(
            sqlx::query_as::<_, Station>("SELECT station, name, latitude, longitude, elevation FROM station")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Station with the most measurements. Ties go to the lowest station identifier.
    pub async fn most_active_station(&self) -> Result<Option<StationActivity>, StoreError> {
        Ok(sqlx::query_as::<_, StationActivity>(
            "SELECT station, COUNT(*) AS count FROM measurement \
             GROUP BY station ORDER BY count DESC, station ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Temperature observations of a single station on or after `since`, ordered by date.
    pub async fn observations_for_station(&self, station: &str, since: NaiveDate) -> Result<Vec<DailyValue>, StoreError> {
        Ok(sqlx::query_as::<_, DailyValue>(
            "SELECT date, tobs AS value FROM measurement WHERE station = ?1 AND date >= ?2 ORDER BY date",
        )
        .bind(station)
        .bind(format_date(since))
        .fetch_all(&self.pool)
        .await?)
    }
}
