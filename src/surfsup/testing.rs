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

//! In-memory SQLite fixtures shared by the unit tests.

use crate::store::{ClimateStore, Measurement, Station};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

// Same layout as the tables in hawaii.sqlite
const SCHEMA: &[&str] = &[
    "CREATE TABLE station (id INTEGER PRIMARY KEY, station TEXT, name TEXT, latitude FLOAT, longitude FLOAT, elevation FLOAT)",
    "CREATE TABLE measurement (id INTEGER PRIMARY KEY, station TEXT, date TEXT, prcp FLOAT, tobs FLOAT)",
];

/// A single connection, since every connection to `sqlite::memory:` gets its own database.
pub async fn memory_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

pub async fn empty_store_with_pool() -> (ClimateStore, SqlitePool) {
    let pool = memory_pool().await;
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(&pool).await.unwrap();
    }

    (ClimateStore::new(pool.clone()), pool)
}

pub async fn empty_store() -> ClimateStore {
    empty_store_with_pool().await.0
}

pub async fn insert_station(pool: &SqlitePool, station: &Station) {
    sqlx::query("INSERT INTO station (station, name, latitude, longitude, elevation) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(&station.station)
        .bind(&station.name)
        .bind(station.latitude)
        .bind(station.longitude)
        .bind(station.elevation)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn insert_measurement(pool: &SqlitePool, station: &str, date: &str, prcp: Option<f64>, tobs: Option<f64>) {
    sqlx::query("INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)")
        .bind(station)
        .bind(date)
        .bind(prcp)
        .bind(tobs)
        .execute(pool)
        .await
        .unwrap();
}

pub fn stations() -> Vec<Station> {
    vec![
        Station {
            station: "USC00519397".to_owned(),
            name: "WAIKIKI 717.2, HI US".to_owned(),
            latitude: 21.2716,
            longitude: -157.8168,
            elevation: 3.0,
        },
        Station {
            station: "USC00513117".to_owned(),
            name: "KANEOHE 838.1, HI US".to_owned(),
            latitude: 21.4234,
            longitude: -157.8015,
            elevation: 14.6,
        },
        Station {
            station: "USC00519281".to_owned(),
            name: "WAIHEE 837.5, HI US".to_owned(),
            latitude: 21.45167,
            longitude: -157.84889,
            elevation: 32.9,
        },
    ]
}

pub fn measurements() -> Vec<Measurement> {
    let m = |station: &str, date: &str, prcp: Option<f64>, tobs: Option<f64>| Measurement {
        station: station.to_owned(),
        date: date.to_owned(),
        prcp,
        tobs,
    };

    vec![
        m("USC00519397", "2016-08-22", Some(0.1), Some(78.0)),
        m("USC00519397", "2017-01-15", Some(0.0), Some(64.0)),
        m("USC00519281", "2016-08-23", Some(1.79), Some(77.0)),
        m("USC00519281", "2017-01-01", Some(0.29), Some(60.0)),
        m("USC00519281", "2017-01-15", None, Some(66.0)),
        m("USC00519281", "2017-01-31", Some(0.0), Some(72.0)),
        m("USC00519281", "2017-08-23", Some(0.45), Some(81.0)),
        m("USC00513117", "2017-02-01", Some(0.2), Some(68.0)),
        m("USC00513117", "2017-08-23", Some(0.0), None),
    ]
}

/// Three stations and nine measurements, the latest of which is on 2017-08-23.
pub async fn fixture_store() -> ClimateStore {
    let (store, pool) = empty_store_with_pool().await;
    for s in stations() {
        insert_station(&pool, &s).await;
    }

    for m in measurements() {
        insert_measurement(&pool, &m.station, &m.date, m.prcp, m.tobs).await;
    }

    store
}
