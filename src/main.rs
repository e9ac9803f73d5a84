//! Campaign Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = campaign_backend::run().await {
        tracing::error!("Fatal: {}", e);
        eprintln!("campaign-backend: {e}");
        std::process::exit(1);
    }
}
