#[tokio::main]
async fn main() -> anyhow::Result<()> {
    syncscript_server::start().await
}
