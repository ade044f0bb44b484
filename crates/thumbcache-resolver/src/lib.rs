//! Playback Resolver (§4.C): resolves a video id to a playable media URL
//! through ordered providers with fallback, and owns egress proxy
//! selection shared by every provider.

pub mod error;
pub mod providers;
pub mod proxy;
pub mod signing_helper;

pub use error::{ResolverError, ResolverResult};
pub use proxy::{ProxySelector, ProxySource};
pub use signing_helper::{HelperAddress, SigningHelperClient};

use std::time::Duration;

use thumbcache_coordinator::CoordinatorStore;
use thumbcache_models::{PlaybackUrl, ProxyInfo, VideoId};
use tracing::{debug, warn};

use providers::floatie::{self, FloatieConfig};
use providers::ytdlp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Floatie,
    Ytdlp,
}

pub struct ResolverConfig {
    /// Providers to try, in order. A disabled provider is simply absent
    /// from this list rather than carrying its own flag.
    pub provider_order: Vec<ProviderKind>,
    pub default_max_height: u32,
    pub visitor_data: Option<String>,
    pub po_token: Option<String>,
    pub signing_helper_address: Option<HelperAddress>,
    pub max_player_age: Duration,
}

/// The result of a successful resolve: the playback URL plus whichever
/// proxy (if any) was used to reach it, so the generator can decide
/// whether retrying through a proxy is still an option on extractor
/// failure.
pub struct Resolved {
    pub playback: PlaybackUrl,
    pub proxy: Option<ProxyInfo>,
}

pub struct Resolver {
    config: ResolverConfig,
    http: reqwest::Client,
    proxy_selector: ProxySelector,
    signing_helper: Option<tokio::sync::Mutex<SigningHelperClient>>,
}

impl Resolver {
    pub fn new(
        config: ResolverConfig,
        proxy_source: ProxySource,
        coordinator: CoordinatorStore,
    ) -> ResolverResult<Self> {
        let http = reqwest::Client::builder().build()?;
        let proxy_selector = ProxySelector::new(proxy_source, coordinator, http.clone());
        let signing_helper = config
            .signing_helper_address
            .clone()
            .map(|addr| tokio::sync::Mutex::new(SigningHelperClient::new(addr)));
        Ok(Self {
            config,
            http,
            proxy_selector,
            signing_helper,
        })
    }

    /// Try each configured provider in order, falling back to the next on
    /// a transient failure. Playability/login-required errors stop the
    /// chain immediately since no provider will fare better.
    pub async fn resolve(&self, video_id: &VideoId) -> ResolverResult<Resolved> {
        if self.config.provider_order.is_empty() {
            return Err(ResolverError::NoProviderEnabled);
        }

        let proxy = self.proxy_selector.pick().await?;
        let proxy_url = proxy.as_ref().map(|p| p.url.as_str());

        let mut last_error: Option<ResolverError> = None;
        for provider in &self.config.provider_order {
            let attempt = self.resolve_with(*provider, video_id, proxy_url).await;
            match attempt {
                Ok(playback) => return Ok(Resolved { playback, proxy }),
                Err(e) if e.is_transient() => {
                    warn!(provider = ?provider, error = %e, "provider failed transiently, trying next");
                    last_error = Some(e);
                }
                Err(e) => {
                    debug!(provider = ?provider, error = %e, "provider gave a terminal verdict");
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or(ResolverError::NoProviderEnabled))
    }

    async fn resolve_with(
        &self,
        provider: ProviderKind,
        video_id: &VideoId,
        proxy_url: Option<&str>,
    ) -> ResolverResult<PlaybackUrl> {
        match provider {
            ProviderKind::Floatie => {
                let helper_lock = self
                    .signing_helper
                    .as_ref()
                    .ok_or_else(|| {
                        ResolverError::SigningHelper(
                            "floatie provider enabled without a signing helper address"
                                .to_string(),
                        )
                    })?;
                let mut helper = helper_lock.lock().await;
                let floatie_config = FloatieConfig {
                    visitor_data: self.config.visitor_data.clone(),
                    po_token: self.config.po_token.clone(),
                    max_player_age: self.config.max_player_age,
                    default_max_height: self.config.default_max_height,
                };
                floatie::resolve(&self.http, &mut helper, &floatie_config, video_id, proxy_url)
                    .await
            }
            ProviderKind::Ytdlp => {
                ytdlp::resolve(video_id, proxy_url, self.config.default_max_height).await
            }
        }
    }
}
