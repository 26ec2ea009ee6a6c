// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const JOBS_ENQUEUED: &str = "sync_jobs_enqueued_total";
pub const JOBS_REJECTED: &str = "sync_jobs_rejected_total";
pub const JOBS_COMPLETED: &str = "sync_jobs_completed_total";
pub const JOBS_FAILED: &str = "sync_jobs_failed_total";
pub const JOB_DURATION: &str = "sync_job_duration_seconds";

/// 注册指标描述
pub fn describe_metrics() {
    describe_counter!(JOBS_ENQUEUED, "Sync jobs accepted by the queue");
    describe_counter!(JOBS_REJECTED, "Sync jobs rejected at admission, by reason");
    describe_counter!(JOBS_COMPLETED, "Sync jobs that finished successfully");
    describe_counter!(JOBS_FAILED, "Sync jobs that failed, by site");
    describe_histogram!(JOB_DURATION, Unit::Seconds, "Wall time spent processing a sync job");
}

pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}
