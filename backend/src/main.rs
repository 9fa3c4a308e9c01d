#[tokio::main]
async fn main() -> anyhow::Result<()> {
    masterchef::start_server().await
}
