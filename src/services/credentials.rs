use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ordered secrets for one external service, with a shared rotation cursor.
///
/// Rotation is the only mutation; it is lock-free so concurrent analyses can
/// share a pool through `Arc`.
pub struct CredentialPool {
    secrets: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Blank and whitespace-only entries are dropped.
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let secrets = secrets
            .into_iter()
            .map(Into::into)
            .map(|secret: String| secret.trim().to_string())
            .filter(|secret| !secret.is_empty())
            .collect();
        Self {
            secrets,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// `None` means no credential is configured.
    pub fn current(&self) -> Option<&str> {
        if self.secrets.is_empty() {
            return None;
        }
        let index = self.cursor.load(Ordering::SeqCst) % self.secrets.len();
        Some(self.secrets[index].as_str())
    }

    pub fn rotate(&self) {
        let len = self.secrets.len();
        if len <= 1 {
            return;
        }
        let _ = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cursor| Some((cursor + 1) % len));
    }

    /// 1-based position of the active credential, for log lines.
    pub fn position(&self) -> usize {
        if self.secrets.is_empty() {
            0
        } else {
            self.cursor.load(Ordering::SeqCst) % self.secrets.len() + 1
        }
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("secrets", &format_args!("[{} redacted]", self.secrets.len()))
            .field("position", &self.position())
            .finish()
    }
}
