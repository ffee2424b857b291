use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// Where per-record outcomes are reported.
pub trait Notifier {
    fn notify(&self, record_key: &str, severity: Severity, message: &str);
}

/// Reports through `tracing`, so messages reach both the console and the log file.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, record_key: &str, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!(record_key, "{}", message),
            Severity::Warning => warn!(record_key, "{}", message),
        }
    }
}

/// Collects notifications in order.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct Recorder(pub std::cell::RefCell<Vec<(String, Severity, String)>>);

#[cfg(test)]
impl Notifier for &Recorder {
    fn notify(&self, record_key: &str, severity: Severity, message: &str) {
        self.0
            .borrow_mut()
            .push((record_key.to_string(), severity, message.to_string()));
    }
}
