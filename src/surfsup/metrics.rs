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

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;
use std::fmt;

/// Content type of the text exposition format written by `encode_text`.
pub const OPENMETRICS_TEXT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RequestLabels {
    route: String,
    status: String,
}

/// Holder for metrics about requests served by the API.
///
/// All metrics are created and registered upon call to `RequestMetrics::new()`.
/// Metrics all share the prefix "surfsup_" and have a "route" label set to the
/// matched route pattern (e.g. `{route="/api/v1.0/:start"}`) so that arbitrary
/// dates in request paths don't create new series.
#[derive(Debug)]
pub struct RequestMetrics {
    requests: Family<RequestLabels, Counter>,
}

impl RequestMetrics {
    /// Create a new `RequestMetrics` and register each metric with the provided `Registry`.
    pub fn new(reg: &mut Registry) -> Self {
        let requests = Family::<RequestLabels, Counter>::default();
        reg.register(
            "surfsup_http_requests",
            "HTTP requests served by route and status",
            requests.clone(),
        );

        Self { requests }
    }

    /// Count a request to `route` that was answered with `status`.
    pub fn request(&self, route: &str, status: u16) {
        self.requests.get_or_create(&Self::labels(route, status)).inc();
    }

    /// Number of requests to `route` answered with `status` so far.
    pub fn requests(&self, route: &str, status: u16) -> u64 {
        self.requests.get_or_create(&Self::labels(route, status)).get()
    }

    fn labels(route: &str, status: u16) -> RequestLabels {
        RequestLabels {
            route: route.to_owned(),
            status: status.to_string(),
        }
    }
}

/// Encode every metric in the registry in the OpenMetrics text format.
pub fn encode_text(reg: &Registry) -> Result<String, fmt::Error> {
    let mut buf = String::new();
    prometheus_client::encoding::text::encode(&mut buf, reg)?;
    Ok(buf)
}
