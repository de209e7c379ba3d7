#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = alemni_rust::run_worker().await {
        eprintln!("alemni-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
