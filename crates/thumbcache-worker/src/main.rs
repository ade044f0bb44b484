//! Thumbnail generation worker binary. One process, one job at a time (§5).

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use thumbcache_config::{AppConfig, NsigHelperTransport};
use thumbcache_coordinator::{CoordinatorConfig, CoordinatorStore};
use thumbcache_extractor::FrameExtractor;
use thumbcache_resolver::{HelperAddress, ProviderKind, ProxySource, Resolver, ResolverConfig};
use thumbcache_storage::{ArtifactStore, ArtifactStoreConfig};
use thumbcache_worker::{Generator, GeneratorConfig, JobExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("thumbcache=info".parse().unwrap()))
        .init();

    info!("starting thumbcache-worker");

    let app_config = match AppConfig::load(None) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    let worker_config = WorkerConfig::from_app_config(app_config.clone());

    let coordinator = match CoordinatorStore::new(&CoordinatorConfig {
        host: app_config.coordinator.host.clone(),
        port: app_config.coordinator.port,
    }) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to connect to coordinator store");
            std::process::exit(1);
        }
    };

    let storage = ArtifactStore::new(ArtifactStoreConfig {
        root: app_config.cache_root(),
    });

    let helper_address = app_config
        .yt_auth
        .nsig_helper
        .transport
        .as_ref()
        .map(|transport| match transport {
            NsigHelperTransport::Tcp { host, port } => HelperAddress::Tcp(host.clone(), *port),
            NsigHelperTransport::Unix { path } => HelperAddress::Unix(path.clone()),
        });

    let mut provider_order = Vec::new();
    if app_config.try_floatie && helper_address.is_some() {
        provider_order.push(ProviderKind::Floatie);
    }
    if app_config.try_ytdlp && which::which("yt-dlp").is_ok() {
        provider_order.push(ProviderKind::Ytdlp);
    }

    let resolver_config = ResolverConfig {
        provider_order,
        default_max_height: app_config.default_max_height,
        visitor_data: app_config.yt_auth.visitor_data.clone(),
        po_token: app_config.yt_auth.po_token.clone(),
        signing_helper_address: helper_address,
        max_player_age: app_config.yt_auth.nsig_helper.max_player_age(),
    };

    let proxy_source = match (&app_config.proxy_token, &app_config.proxy_urls) {
        (Some(token), _) => ProxySource::Remote {
            api_token: token.clone(),
        },
        (None, Some(entries)) if !entries.is_empty() => ProxySource::Static(
            entries.iter().cloned().map(Into::into).collect(),
        ),
        _ => ProxySource::Disabled,
    };

    let resolver = match Resolver::new(resolver_config, proxy_source, coordinator.clone()) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "failed to construct resolver");
            std::process::exit(1);
        }
    };

    let extractor = match FrameExtractor::discover(worker_config.extractor_log_dir.clone()) {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, "extractor binary not found on PATH");
            std::process::exit(1);
        }
    };

    let generator_config = GeneratorConfig {
        skip_local_extractor: app_config.skip_local_extractor,
        storage_max_size_bytes: app_config.thumbnail_storage.max_size_bytes,
    };
    let generator = Generator::new(
        storage,
        coordinator.clone(),
        resolver,
        extractor,
        worker_config.work_dir.clone(),
        generator_config,
    );

    let executor = JobExecutor::new(worker_config, coordinator, generator);

    let shutdown_handle = tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
    });

    if let Err(e) = executor.run().await {
        error!(error = %e, "executor error");
        std::process::exit(1);
    }

    shutdown_handle.await.ok();
    info!("worker shutdown complete");
}
