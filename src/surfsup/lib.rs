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

//! Read-only HTTP API for Hawaii climate observations
//!
//! ## Features
//!
//! `surfsup` serves aggregate queries over a SQLite database of weather stations and their
//! daily precipitation and temperature measurements. The database must contain a `station`
//! table and a `measurement` table (the layout used by `hawaii.sqlite`). It is opened
//! read-only and never modified. The following routes are available.
//!
//! * `/` - Listing of the available routes.
//! * `/api/v1.0/precipitation` - Precipitation by date for the year leading up to the most
//!   recent measurement.
//! * `/api/v1.0/stations` - Every station with its name, location, and elevation.
//! * `/api/v1.0/tobs` - Temperature by date for the most active station (the one with the
//!   most measurements) for the year leading up to the most recent measurement.
//! * `/api/v1.0/$START` - Minimum, average, and maximum temperature on or after `$START`.
//! * `/api/v1.0/$START/$END` - Minimum, average, and maximum temperature between `$START`
//!   and `$END`, inclusive.
//! * `/metrics` - Prometheus metrics about requests served.
//!
//! Dates are given as `YYYY-MM-DD`. Requests with dates that can't be parsed are rejected
//! with a `400` status and a body like `{"error": "invalid start date ..."}`. When no
//! measurements fall in the requested range, `tmin`, `tavg`, and `tmax` are all `null`.
//!
//! When several stations report precipitation on the same date, the value reported for the
//! station with the highest identifier is used.
//!
//! ## Build
//!
//! `surfsup` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! Point `surfsup` at the SQLite database to serve.
//!
//! ```text
//! ./surfsup --database-url sqlite://Resources/hawaii.sqlite
//! ```
//!
//! The API is served on `127.0.0.1:5000` by default. Use `--bind` to listen on a different
//! address. Run `./surfsup --help` for all available options.
//!
//! ```text
//! curl -sS 'http://localhost:5000/api/v1.0/2017-01-01/2017-01-31'
//! [{"tmin":60.0,"tavg":69.2,"tmax":81.0}]
//! ```
//!

pub mod http;
pub mod metrics;
pub mod store;

#[cfg(test)]
mod testing;
