use anyhow::{Context, Result};
use clap::Parser;
use http::Method;
use keystone_client::config::loader::file_to_config;
use keystone_client::observability::metrics::get_metrics;
use keystone_client::utils::logging::{self, LogLevel};
use keystone_client::{MemoryCache, ReqwestTransport, TokenManager};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "keystone-client.yaml")]
    config: PathBuf,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// HTTP method of the request
    #[arg(short = 'X', long, default_value = "GET")]
    method: Method,
    /// JSON request body
    #[arg(short, long)]
    data: Option<String>,
    /// Print prometheus metrics after the request
    #[arg(long)]
    print_metrics: bool,
    /// Path relative to the service public URL, or an absolute URL
    path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Build token manager and client
    // -------------------------------

    let settings = &service_config.settings;
    let transport = ReqwestTransport::with_timeout(Duration::from_millis(settings.http.timeout_ms))?;
    let cache = MemoryCache::with_capacity(settings.cache.max_entries);
    let manager = TokenManager::with_transport(Arc::new(cache), Arc::new(transport));

    let keystone = &service_config.keystone;
    let mut builder = manager.client_builder(
        &keystone.token_url,
        &keystone.username,
        &keystone.password,
        &keystone.service_type,
    );
    if let Some(tenant_name) = &keystone.tenant_name {
        builder = builder.tenant_name(tenant_name);
    }
    if let Some(service_name) = &keystone.service_name {
        builder = builder.service_name(service_name);
    }
    let client = builder.build();

    // -------------------------------
    // 3. Issue the request
    // -------------------------------

    let mut request = client.request(args.method.clone(), &args.path).await?;
    if let Some(data) = &args.data {
        let body: serde_json::Value = serde_json::from_str(data).context("--data is not valid JSON")?;
        request = request.with_json(&body)?;
    }
    info!("{} {}", request.method(), request.url());
    let response = client.send(request).await?;

    println!("{}", response.status());
    println!("{}", response.text());

    if args.print_metrics {
        println!("{}", get_metrics().await.render());
    }
    Ok(())
}
