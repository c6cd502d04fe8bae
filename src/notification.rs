use std::sync::Arc;

const APP_NAME: &str = "ScopeHunter";

/// Surfaces user-facing failures, at most once per failing operation.
pub trait Notifier: Send + Sync {
    fn notify(&self, body: &str);
}

/// Pops a desktop notification; falls back to a log line if the
/// notification daemon is unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, body: &str) {
        if let Err(err) = notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(APP_NAME)
            .body(body)
            .show()
        {
            tracing::warn!("system notification failed: {err}");
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, body: &str) {
        tracing::warn!(target: "scope_hunter::notification", "{body}");
    }
}

pub fn from_config(desktop: bool) -> Arc<dyn Notifier> {
    if desktop {
        Arc::new(DesktopNotifier)
    } else {
        Arc::new(LogNotifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_notifier_is_used_unless_desktop_is_requested() {
        let notifier = from_config(false);
        notifier.notify("Evaluating theme failed! Ignoring theme related info.");

        let shared = Arc::clone(&notifier);
        std::thread::spawn(move || shared.notify("from another thread"))
            .join()
            .expect("notifier is shareable across threads");
    }
}
