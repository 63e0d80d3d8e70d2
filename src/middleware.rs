//! Middleware implementation for reqwest.
//!
//! The thin adapter layered over the core: each outgoing request is routed
//! through the pool's current rotation pick, with failed attempts reported
//! back as health evidence and retried through the next pick.

use crate::binder::{self, ClientCapabilities};
use crate::error::NoProxyAvailable;
use crate::pool::ProxyPool;

use anyhow::anyhow;
use async_trait::async_trait;
use log::{info, warn};
use reqwest_middleware::{Error, Middleware, Next, Result};
use std::sync::Arc;

/// Middleware that uses a rotating pool of proxies for HTTP requests.
#[derive(Clone)]
pub struct ProxyPoolMiddleware {
    pool: Arc<ProxyPool>,
}

impl ProxyPoolMiddleware {
    /// Wrap an already-populated pool. Registration and background checks
    /// stay the caller's business.
    pub fn new(pool: Arc<ProxyPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Middleware for ProxyPoolMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        _extensions: &mut http::Extensions,
        _next: Next<'_>,
    ) -> Result<reqwest::Response> {
        let max_retries = self.pool.config.retry_count;
        let mut attempt = 0;

        loop {
            let Some(record) = self.pool.next(true).await else {
                let (total, alive) = self.pool.stats();
                warn!("No proxy available. Total: {}, Alive: {}", total, alive);
                return Err(Error::Middleware(anyhow!(NoProxyAvailable)));
            };

            let proxied_request = req.try_clone().ok_or_else(|| {
                Error::Middleware(anyhow!(
                    "Request object is not cloneable. Are you passing a streaming body?"
                ))
            })?;

            info!("Using proxy: {} (attempt {})", record, attempt + 1);

            // Apply per-proxy rate limiting before dispatch.
            record.limiter.until_ready().await;

            // reqwest speaks every scheme the pool accepts, so binding here
            // cannot fail on capability grounds.
            let config = match binder::bind(&record, ClientCapabilities::all()) {
                Ok(config) => config,
                Err(err) => {
                    warn!("Cannot bind proxy {}: {}", record, err);
                    self.pool.report_failure(&record);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Middleware(anyhow!(err)));
                    }
                    continue;
                }
            };

            let reqwest_proxy = match config.to_reqwest_proxy() {
                Ok(proxy) => proxy,
                Err(err) => {
                    warn!("Failed to create proxy from {}: {}", config, err);
                    self.pool.report_failure(&record);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Reqwest(err));
                    }
                    continue;
                }
            };

            let client = match reqwest::Client::builder()
                .proxy(reqwest_proxy)
                .timeout(self.pool.config.probe_timeout)
                .build()
            {
                Ok(client) => client,
                Err(err) => {
                    warn!("Failed to build client with proxy {}: {}", config, err);
                    self.pool.report_failure(&record);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Reqwest(err));
                    }
                    continue;
                }
            };

            match client.execute(proxied_request).await {
                Ok(response) => {
                    self.pool.report_success(&record);
                    return Ok(response);
                }
                Err(err) => {
                    warn!(
                        "Request failed with proxy {} (attempt {}): {}",
                        config,
                        attempt + 1,
                        err
                    );
                    self.pool.report_failure(&record);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Reqwest(err));
                    }
                    // Loop continues with the next rotation pick.
                }
            }
        }
    }
}
