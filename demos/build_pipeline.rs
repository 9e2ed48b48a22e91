//! Build pipeline example: ordered stages with a concurrent finish

use std::error::Error;

use taskqueue::queue::TaskQueue;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🚀 TaskQueue - Build Pipeline Example\n");

    // Stage 1 must finish before stage 2 starts; the packaging steps in
    // stage 3 are independent and run together.
    let queue = TaskQueue::new("release")
        .add_sequential([
            "echo '[clean] removing build artifacts' && sleep 0.2",
            "echo '[build] compiling' && sleep 0.3",
        ])
        .add_sequential(["echo '[test] running the suite' && sleep 0.2"])
        .add_concurrent([
            "echo '[docs] rendering documentation' && sleep 0.3",
            "echo '[package] building the archive' && sleep 0.2",
        ]);

    println!("Running {} batches...\n", queue.len());

    match queue.run().await {
        Ok(()) => println!("\n✅ Pipeline completed"),
        Err(error) => println!("\n❌ Pipeline failed: {error}"),
    }

    Ok(())
}
