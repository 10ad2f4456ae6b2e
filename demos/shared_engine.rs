//! A process-wide engine reconfigured at runtime.
//!
//! This demo shows how an application shares one [`Engine`]:
//! 1. Start from the basic preset
//! 2. Clean from several threads at once
//! 3. Swap in a policy loaded from JSON while the workers run
//! 4. Reject a bad configuration without disturbing the active policy
//!
//! Run with: `cargo run --example shared_engine`

use std::sync::{Arc, OnceLock};
use std::thread;

use sanitize_policy::Engine;

static ENGINE: OnceLock<Arc<Engine>> = OnceLock::new();

fn engine() -> &'static Arc<Engine> {
    ENGINE.get_or_init(|| Arc::new(Engine::default()))
}

const COMMENT_POLICY: &str = r#"{
    "elements": ["p", "em", "strong", "a"],
    "attributes": { "a": ["href"] },
    "add_attributes": { "a": { "rel": "nofollow ugc" } },
    "protocols": { "a": { "href": ["https", "relative"] } },
    "remove_contents": ["script", "style"]
}"#;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Shared Engine Example ===\n");

    let input = r#"<p>Nice <b>post</b>! <a href="https://example.com">link</a><script>x()</script></p>"#;

    println!("--- Scenario 1: Basic Preset ---");
    match engine().clean(input) {
        Ok(html) => println!("{}\n", html),
        Err(e) => eprintln!("Cleaning failed: {}\n", e),
    }

    println!("--- Scenario 2: Reconfigure While Workers Run ---");
    let workers: Vec<_> = (0..3)
        .map(|id| {
            let engine = Arc::clone(engine());
            thread::spawn(move || {
                for _ in 0..3 {
                    match engine.clean(input) {
                        Ok(html) => println!("worker {}: {}", id, html),
                        Err(e) => eprintln!("worker {} failed: {}", id, e),
                    }
                }
            })
        })
        .collect();

    if let Err(e) = engine().configure_json(COMMENT_POLICY) {
        eprintln!("Configuration rejected: {}", e);
    }

    for worker in workers {
        if worker.join().is_err() {
            eprintln!("worker panicked");
        }
    }

    println!("\n--- Scenario 3: Active Policy After Swap ---");
    match engine().clean(input) {
        Ok(html) => println!("{}\n", html),
        Err(e) => eprintln!("Cleaning failed: {}\n", e),
    }

    println!("--- Scenario 4: Invalid Configuration ---");
    match engine().configure_json(r#"{ "elements": ["p"], "allow_everything": true }"#) {
        Ok(()) => println!("Unexpected success"),
        Err(e) => println!("Rejected (expected): {}", e),
    }
    match engine().clean(input) {
        Ok(html) => println!("Still using the previous policy: {}", html),
        Err(e) => eprintln!("Cleaning failed: {}", e),
    }
}
