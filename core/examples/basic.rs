//! Basic circuit breaker usage example

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tripwire::{CircuitBreaker, Operation};
use tracing_subscriber::EnvFilter;

/// Pretend payment gateway whose health can be flipped at runtime
struct PaymentApi {
    healthy: Arc<AtomicBool>,
}

impl Operation for PaymentApi {
    type Args = u32;
    type Output = String;
    type Error = String;

    fn call(&self, order: &u32) -> Result<String, String> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(format!("Payment {} accepted", order))
        } else {
            Err(format!("Payment {} failed: gateway unavailable", order))
        }
    }

    fn on_open(&self) {
        println!("   (gateway notified: stop sending traffic)");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tripwire=info")),
        )
        .init();

    println!("=== Circuit Breaker Basic Example ===\n");

    let healthy = Arc::new(AtomicBool::new(true));
    let circuit = CircuitBreaker::builder(PaymentApi {
        healthy: Arc::clone(&healthy),
    })
    .name("payment_api")
    .max_fails(3)
    .timeout(Duration::from_millis(500))
    .on_open(|name| println!("🔴 Circuit '{}' opened!", name))
    .on_close(|name| println!("🟢 Circuit '{}' closed!", name))
    .on_half_open(|name| println!("🟡 Circuit '{}' half-open, testing...", name))
    .build();

    println!("Initial state: {}\n", circuit.state());

    println!("--- Successful calls ---");
    for order in 1..=2 {
        match circuit.call(&order) {
            Ok(Some(result)) => println!("✓ {}", result),
            Ok(None) => println!("✓ (no-op)"),
            Err(e) => println!("✗ Error: {}", e),
        }
    }
    println!("State: {}\n", circuit.state());

    println!("--- Triggering failures ---");
    healthy.store(false, Ordering::SeqCst);
    for order in 3..=5 {
        if let Err(e) = circuit.call(&order) {
            println!("✗ {}", e);
        }
    }
    println!(
        "State: {} (fails: {}, countdown: {})\n",
        circuit.state(),
        circuit.fails(),
        circuit.countdown()
    );

    println!("--- Attempting call while open ---");
    if let Err(e) = circuit.call(&6) {
        println!("✗ {}", e);
    }
    println!();

    println!("--- Waiting for recovery probe ---");
    healthy.store(true, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(800));
    println!(
        "State: {} (calls: {}, fails: {})",
        circuit.state(),
        circuit.calls(),
        circuit.fails()
    );
}
