//! Vector Search Service - Entry Point
//!
//! Minimal entry point that delegates to the server module.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    vector_search_app::run().await
}
