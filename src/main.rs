use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    authpilot_cli::cli::run().await
}
