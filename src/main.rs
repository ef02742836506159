#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gckit::cli::run_cli().await
}
