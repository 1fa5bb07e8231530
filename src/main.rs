// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use accelerator_operator::{
    actuator::LoggingActuator,
    builder::ModelBuilder,
    cloud::{Elbv2Client, LoadBalancerApi},
    cluster::{ClusterClient, KubeClusterClient},
    config::ControllerConfig,
    constants::KIND_GLOBAL_ACCELERATOR,
    context::Context,
    crd::GlobalAccelerator,
    dns_resolver::DnsResolver,
    endpoints::{EndpointLoader, ResourceKey},
    errors::ReconcileError,
    metrics::{
        gather_metrics, record_error, record_reconciliation_error, record_reconciliation_success,
    },
    reconcilers::{error_requeue_interval, reconcile_globalaccelerator, AcceleratorReconciler},
    tracking::{
        forward_resource_events, EndpointResourcesManager, KubeWatchFactory, ReferenceTracker,
    },
};
use anyhow::Result;
use axum::{http::StatusCode, routing::get, Router};
use clap::Parser;
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, reflector::ObjectRef, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("accelerator-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Respects RUST_LOG (default info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    let config = Arc::new(ControllerConfig::parse());
    info!(
        cluster = %config.cluster_name,
        region = config.default_region.as_deref().unwrap_or("<unset>"),
        "Starting Global Accelerator controller"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    debug!("Initializing ELBv2 client");
    let cloud: Arc<dyn LoadBalancerApi> = Arc::new(Elbv2Client::from_env().await);
    let cluster: Arc<dyn ClusterClient> = Arc::new(KubeClusterClient::new(client.clone()));
    let resolver = Arc::new(DnsResolver::new(cloud.clone(), config.dns_cache_ttl()));

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel::<ResourceKey>();
    let references = Arc::new(ReferenceTracker::new());
    let resources = Arc::new(EndpointResourcesManager::new(
        Arc::new(KubeWatchFactory::new(client.clone(), events_tx)),
        cluster.clone(),
    ));

    let reconciler = AcceleratorReconciler::new(
        EndpointLoader::new(cluster.clone(), resolver.clone()),
        ModelBuilder::new(cluster, cloud, config.clone()),
        references.clone(),
        resources,
        Arc::new(LoggingActuator),
    );

    let ctx = Arc::new(Context {
        client: client.clone(),
        config: config.clone(),
        reconciler,
        references: references.clone(),
    });

    let (trigger_tx, trigger_rx) =
        futures::channel::mpsc::unbounded::<ObjectRef<GlobalAccelerator>>();

    // The controller stops on SIGINT/SIGTERM; every other task runs for the life of the process
    tokio::select! {
        result = run_controller(client, ctx, trigger_rx) => {
            info!("GlobalAccelerator controller stopped");
            result
        }
        () = forward_resource_events(events_rx, references, trigger_tx) => {
            anyhow::bail!("Endpoint resource event stream closed unexpectedly")
        }
        () = purge_dns_cache(resolver, config.dns_cache_ttl()) => {
            anyhow::bail!("DNS cache maintenance stopped unexpectedly")
        }
        result = run_metrics_server(&config.metrics_bind_address) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
    }
}

/// Run the `GlobalAccelerator` controller
async fn run_controller(
    client: Client,
    ctx: Arc<Context>,
    triggers: futures::channel::mpsc::UnboundedReceiver<ObjectRef<GlobalAccelerator>>,
) -> Result<()> {
    info!("Starting GlobalAccelerator controller");

    let api = Api::<GlobalAccelerator>::all(client);

    Controller::new(api, Config::default())
        .reconcile_on(triggers)
        .shutdown_on_signal()
        .run(reconcile_globalaccelerator_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `GlobalAccelerator`
async fn reconcile_globalaccelerator_wrapper(
    ga: Arc<GlobalAccelerator>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_globalaccelerator(ga.clone(), ctx).await {
        Ok(action) => {
            record_reconciliation_success(KIND_GLOBAL_ACCELERATOR, start.elapsed());
            debug!(
                "Successfully reconciled GlobalAccelerator: {}",
                ga.name_any()
            );
            Ok(action)
        }
        Err(e) => {
            record_reconciliation_error(KIND_GLOBAL_ACCELERATOR, start.elapsed());
            record_error(KIND_GLOBAL_ACCELERATOR, e.status_reason());
            error!("Failed to reconcile GlobalAccelerator {}: {}", ga.name_any(), e);
            Err(e)
        }
    }
}

/// Error policy for the `GlobalAccelerator` controller
fn error_policy(_resource: Arc<GlobalAccelerator>, err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(error_requeue_interval(err))
}

/// Periodically drop expired DNS cache entries.
async fn purge_dns_cache(resolver: Arc<DnsResolver>, ttl: Duration) {
    let mut interval = tokio::time::interval(ttl.max(Duration::from_secs(1)));
    loop {
        interval.tick().await;
        let purged = resolver.purge_expired().await;
        if purged > 0 {
            debug!(purged, remaining = resolver.len().await, "Purged expired DNS cache entries");
        }
    }
}

/// Serve Prometheus metrics on `/metrics`.
async fn run_metrics_server(bind_address: &str) -> Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    info!("Serving metrics on {}", bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn metrics_handler() -> (StatusCode, String) {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
