//! Active reachability probe for the instance metadata service.
//!
//! Meant to run from inside a pod: if the pod can reach the metadata endpoint,
//! so can any workload without an egress restriction.

use crate::analyzer::checks::imds::{IMDS_URL, ProbeOutcome};
use reqwest::Client;
use std::time::Duration;

/// Default probe timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Issue one GET to the metadata endpoint.
pub async fn probe_imds(timeout: Duration) -> ProbeOutcome {
    probe_url(IMDS_URL, timeout).await
}

/// Issue one GET to `url`. Any HTTP response counts as reachable.
pub async fn probe_url(url: &str, timeout: Duration) -> ProbeOutcome {
    let client = match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            return ProbeOutcome::Unreachable {
                error: e.to_string(),
            };
        }
    };

    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            log::info!("{} answered with status {}", url, status);
            ProbeOutcome::Reachable { status }
        }
        Err(e) => {
            log::info!("{} not reachable: {}", url, e);
            ProbeOutcome::Unreachable {
                error: e.to_string(),
            }
        }
    }
}
