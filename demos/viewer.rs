//! Snapshot viewer
//!
//! Run with: cargo run --example viewer [HUB_ADDR]
//!
//! Prints every snapshot the hub sends. `nc -v HOST 1337` shows the same text.

use mazecast::Viewer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mazecast=info".parse()?),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:1337".to_string());

    let mut viewer = Viewer::connect(addr.as_str()).await?;
    println!("Connected to {}", addr);

    while let Some(snapshot) = viewer.next_snapshot().await? {
        println!("{}", snapshot);
    }

    println!("Hub closed the connection");
    Ok(())
}
