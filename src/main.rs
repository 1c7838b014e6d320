use std::sync::Arc;

use clap::Parser;

use keyharvest::api;
use keyharvest::config::CONFIG;
use keyharvest::pipeline::SearchPipeline;

#[derive(Parser)]
#[command(about = "Keyword universe research for Singapore housing SEO")]
struct Args {
    /// Address to serve the HTTP API on (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Run a single search and print the result as JSON instead of serving
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let args = Args::parse();
    let pipeline = Arc::new(SearchPipeline::from_config(&CONFIG));

    if let Some(query) = args.query {
        let result = pipeline.search(&query).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let bind_addr = args.bind.unwrap_or_else(|| CONFIG.bind_addr.clone());
    let router = api::create_router(pipeline);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("serving keyword search api on {bind_addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
