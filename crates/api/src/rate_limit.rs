//! Rate limiting middleware using the GCRA algorithm.
//!
//! Applied to the dispatch and login routes only: both touch either a
//! paid external API or password checking, so they get a small burst
//! and a slow refill, keyed by peer IP. Requires the service to be
//! built with `into_make_service_with_connect_info::<SocketAddr>()`.

use governor::middleware::StateInformationMiddleware;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;

/// Governor config with the X-RateLimit-* header middleware
pub type DefaultGovernorConfig = GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds per replenished request
    pub per_second: u64,
    /// Requests allowed in an immediate burst
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 2,
            burst_size: 5,
        }
    }
}

/// Build the layer for the sensitive routes. The governor config sits
/// behind an `Arc`, so clones of the layer share one limiter.
pub fn governor_layer(
    config: &RateLimitConfig,
) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
    let governor: DefaultGovernorConfig = GovernorConfigBuilder::default()
        .per_second(config.per_second.max(1))
        .burst_size(config.burst_size.max(1))
        .use_headers()
        .finish()
        .unwrap();
    GovernorLayer {
        config: Arc::new(governor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_second, 2);
        assert_eq!(config.burst_size, 5);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = RateLimitConfig {
            per_second: 0,
            burst_size: 0,
        };
        // Would panic inside the builder without clamping.
        let _layer = governor_layer(&config);
    }

    #[test]
    fn test_layer_attaches_to_router() {
        let layer = governor_layer(&RateLimitConfig::default());
        let _router: axum::Router = axum::Router::new().layer(layer);
    }
}
