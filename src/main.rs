#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = alemni_rust::run().await {
        eprintln!("alemni fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
