//! Integration tests for the platform adapter factory.
//!
//! These tests verify that `current_adapter()` selects the right backend
//! for the host platform and that it is safely callable more than once.

use termmode_core::model::StreamSelector;
use termmode_io::current_adapter;

#[test]
fn current_adapter_selects_the_host_backend() {
    let adapter = current_adapter();

    #[cfg(unix)]
    assert_eq!(adapter.name(), "posix");

    #[cfg(windows)]
    assert_eq!(adapter.name(), "windows");
}

#[test]
fn current_adapter_is_callable_more_than_once() {
    let first = current_adapter();
    let second = current_adapter();

    assert_eq!(first.name(), second.name());
}

#[test]
fn handle_resolves_every_standard_stream_selector() {
    let adapter = current_adapter();

    for selector in [StreamSelector::Stdin, StreamSelector::Stdout, StreamSelector::Stderr] {
        adapter
            .handle(selector)
            .unwrap_or_else(|e| panic!("handle({selector:?}) failed: {e}"));
    }
}

/// POSIX's `build_check` is a no-op regardless of the required build —
/// there is no platform version gate on that side.
#[cfg(unix)]
#[test]
fn build_check_is_a_no_op_on_posix() {
    let adapter = current_adapter();
    assert!(adapter.build_check(u32::MAX).is_ok());
}
