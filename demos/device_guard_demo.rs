//! Degrades gracefully when stdin isn't a real terminal (e.g. piped
//! input), routing that one error class through `InappropriateDeviceGuard`
//! instead of letting it propagate.
//!
//! Run with: cargo run --example device_guard_demo
//! Run piped: echo hi | cargo run --example device_guard_demo

use termmode::InappropriateDeviceGuard;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let guard = InappropriateDeviceGuard::new()
        .on_inappropriate_device(|e| {
            println!("stdin isn't a terminal ({e}); continuing without raw mode");
        })
        .on_other(|e| {
            eprintln!("unexpected driver error: {e}");
        });

    guard.run(|| {
        let item = termmode::no_echo()?;
        println!("no_echo applied, origin={}", item.origin());
        Ok(())
    })?;

    Ok(())
}
