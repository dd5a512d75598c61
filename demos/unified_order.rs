//! Creates a payment order and logs the payload for the client-side payment call.
//!
//! ```sh
//! WX_APPID=... WX_SECRET=... WX_MCH_ID=... WX_MCH_KEY=... WX_OPENID=... \
//!     RUST_LOG=debug cargo run --example unified_order --features tracing
//! ```

use std::env;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use wxapp_sdk::types::UnifiedOrderRequest;
use wxapp_sdk::{Client, Config, Kind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::builder()
        .appid(env::var("WX_APPID")?)
        .secret(env::var("WX_SECRET")?)
        .mch_id(env::var("WX_MCH_ID")?)
        .mch_key(env::var("WX_MCH_KEY")?)
        .notify_url("https://example.com/pay/notify")
        .build();
    let client = Client::new(config)?;

    let order = UnifiedOrderRequest::new(
        &env::var("WX_OPENID")?,
        "DEMO0000000001",
        "demo order",
        "1",
        "127.0.0.1",
    );

    match client.unified_order(&order).await {
        Ok(payment) => info!(payload = %serde_json::to_string(&payment)?, "order created"),
        Err(e) if e.kind() == Kind::Rejected => error!(error = %e, "order rejected"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
