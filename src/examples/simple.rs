//! Simple example of using rotating-proxy-pool.

use reqwest_middleware::ClientBuilder;
use rotating_proxy_pool::{PoolConfig, ProxyPool, ProxyPoolMiddleware, ReqwestProbe};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = PoolConfig::builder()
        .probe_timeout(Duration::from_secs(5))
        .dead_retry_window(Duration::from_secs(60))
        .retry_count(2)
        // rate limit for each proxy, lower performance but avoid banned
        .max_requests_per_second(3.0)
        .build();

    let probe = Arc::new(ReqwestProbe::new("https://httpbin.org/ip"));
    let pool = Arc::new(ProxyPool::new(config, probe));

    let report = pool.register([
        "http://127.0.0.1:8080",
        "socks5://127.0.0.1:1080",
        "socks5://127.0.0.1:1081:alice:secret",
    ]);
    println!(
        "Registered {} proxies ({} duplicates, {} rejected)",
        report.added,
        report.duplicates,
        report.rejected.len()
    );

    // Re-probe the whole pool every five minutes.
    pool.start_background_checks(Duration::from_secs(300));

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::new(Arc::clone(&pool)))
        .build();

    println!("Sending request...");
    let response = client.get("https://httpbin.org/ip").send().await?;

    println!("Status: {}", response.status());
    println!("Response: {}", response.text().await?);

    Ok(())
}
