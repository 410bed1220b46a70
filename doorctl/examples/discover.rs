//! Broadcast discovery example with live progress

use std::time::Duration;

use tokio::sync::mpsc;

use doorctl::Discovery;

#[tokio::main]
async fn main() -> doorctl::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let broadcast = std::env::var("BROADCAST").unwrap_or_else(|_| "255.255.255.255".to_string());

    println!("Scanning {} for controllers...", broadcast);

    let discovery = Discovery::new()
        .with_broadcast(broadcast.parse().expect("invalid broadcast address"))
        .with_window(Duration::from_secs(3));

    // Print each controller the moment it answers
    let (tx, mut rx) = mpsc::channel(16);
    let live = tokio::spawn(async move {
        while let Some(controller) = rx.recv().await {
            println!("✓ {}", controller);
        }
    });

    let controllers = discovery.run_with(Some(tx)).await?;
    live.await.expect("live printer failed");

    println!("Found {} controller(s)", controllers.len());

    Ok(())
}
