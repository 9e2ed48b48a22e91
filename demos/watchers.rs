//! Coupled watchers example: the group discipline terminating siblings

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

    println!("🚀 TaskQueue - Coupled Watchers Example\n");

    // Two long-running watchers and a check that fails quickly. The group
    // discipline terminates both watchers as soon as the check fails;
    // without it they would keep running for a minute.
    let queue = TaskQueue::new("watchers").add_group([
        "echo '[server] watching' && sleep 60",
        "echo '[tests] watching' && sleep 60",
        "sleep 1 && echo '[check] broken configuration' && exit 1",
    ]);

    match queue.run().await {
        Ok(()) => println!("\n✅ Watchers finished"),
        Err(error) => {
            println!("\n❌ Group failed: {error}");
            println!(
                "   all watchers terminated: {}",
                queue.all_terminated()
            );
        }
    }

    Ok(())
}
