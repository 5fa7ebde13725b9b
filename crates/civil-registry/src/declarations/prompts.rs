//! User-facing prompts the collection view depends on.

/// Interactive yes/no confirmation.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Blocking notification shown to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

impl<F> Notifier for F
where
    F: Fn(&str),
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Notifier that only records the message in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(%message, "user notification");
    }
}
