//! Device-Error Guard: a scoped resource that intercepts "inappropriate
//! device" errors from operations run in its body and dispatches them to a
//! user-supplied action, separate from other error classes.

use crate::error::{EnvError, EnvResult};

/// Intended for callers that want to degrade gracefully when launched
/// under a non-TTY (piped, redirected, IDE console). Defaults re-raise:
/// an unset handler propagates the error unchanged.
#[derive(Default)]
pub struct InappropriateDeviceGuard<T> {
    on_inappropriate_device: Option<Box<dyn Fn(EnvError) -> T + Send + Sync>>,
    on_other: Option<Box<dyn Fn(EnvError) -> T + Send + Sync>>,
}

impl<T> InappropriateDeviceGuard<T> {
    pub fn new() -> Self {
        Self {
            on_inappropriate_device: None,
            on_other: None,
        }
    }

    /// Sets the action for `EnvError::NotATerminal` (POSIX errno 25,
    /// Windows error 6).
    pub fn on_inappropriate_device<F>(mut self, f: F) -> Self
    where
        F: Fn(EnvError) -> T + Send + Sync + 'static,
    {
        self.on_inappropriate_device = Some(Box::new(f));
        self
    }

    /// Sets the action for every other exception class escaping the body.
    pub fn on_other<F>(mut self, f: F) -> Self
    where
        F: Fn(EnvError) -> T + Send + Sync + 'static,
    {
        self.on_other = Some(Box::new(f));
        self
    }

    /// Runs `body`. The guard's exit value is whatever the selected action
    /// returns, or `body`'s own `Ok` value, or the original error if no
    /// handler is registered for its class (re-raise default).
    pub fn run<F>(&self, body: F) -> EnvResult<T>
    where
        F: FnOnce() -> EnvResult<T>,
    {
        match body() {
            Ok(v) => Ok(v),
            Err(e) if e.is_inappropriate_device() => match &self.on_inappropriate_device {
                Some(action) => Ok(action(e)),
                None => Err(e),
            },
            Err(e) => match &self.on_other {
                Some(action) => Ok(action(e)),
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inappropriate_device_is_routed_to_its_own_handler() {
        let guard = InappropriateDeviceGuard::new()
            .on_inappropriate_device(|_| "handled")
            .on_other(|_| "other");

        let result = guard.run(|| Err(EnvError::NotATerminal { source: None }));
        assert_eq!(result.unwrap(), "handled");
    }

    #[test]
    fn other_errors_go_to_on_other() {
        let guard = InappropriateDeviceGuard::new()
            .on_inappropriate_device(|_| "handled")
            .on_other(|_| "other");

        let result = guard.run(|| {
            Err(EnvError::ApplyFailed {
                source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            })
        });
        assert_eq!(result.unwrap(), "other");
    }

    #[test]
    fn unset_handler_re_raises() {
        let guard: InappropriateDeviceGuard<()> = InappropriateDeviceGuard::new();
        let result = guard.run(|| Err(EnvError::NotATerminal { source: None }));
        assert!(result.is_err());
    }
}
