use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    pokerterm::cli::run_cli().await
}
