//! Suppresses stdin echo for the lifetime of this process and shows the
//! exit-time rollback firing automatically.
//!
//! Run with: cargo run --example no_echo_demo

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("Requesting no_echo()...");
    let item = termmode::no_echo()?;
    println!("origin (echo was already off?): {}", item.origin());
    println!("request (echo off now?): {}", item.request());
    println!("Type something; it will not be echoed back by the driver.");
    println!("Exiting now — the Exit Coordinator restores the original echo setting.");

    Ok(())
}
