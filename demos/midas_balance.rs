//! Fetches an access token and queries a user's sandbox virtual-currency balance.
//!
//! ```sh
//! WX_APPID=... WX_SECRET=... WX_OFFER_ID=... WX_MIDAS_SECRET=... WX_OPENID=... \
//!     RUST_LOG=wxapp_sdk=debug cargo run --example midas_balance --features tracing
//! ```

use std::env;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use wxapp_sdk::{Client, Config, Environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::builder()
        .appid(env::var("WX_APPID")?)
        .secret(env::var("WX_SECRET")?)
        .mch_id(String::new())
        .notify_url(String::new())
        .midas_offer_id(env::var("WX_OFFER_ID")?)
        .midas_secret(env::var("WX_MIDAS_SECRET")?)
        .build();
    let client = Client::new(config)?;

    let token = client.get_token().await?;
    if !token.is_success() {
        warn!(errcode = token.errcode, errmsg = %token.errmsg, "token request failed");
        return Ok(());
    }

    let openid = env::var("WX_OPENID")?;
    let balance = client
        .midas_get_balance(&openid, &token.access_token, "android", Environment::Sandbox)
        .await?;
    info!(?balance, "balance");

    Ok(())
}
