use tokio::sync::Mutex;
use zeroize::Zeroizing;

pub const PIN_LEN: usize = 4;

/// Explicit session state shared between the API client and the transfer
/// workflow: the bearer token and the in-progress transaction PIN. Both are
/// injected into their consumers instead of living in ambient storage.
///
/// The PIN buffer backs the per-digit entry boxes in the UI: unset positions
/// hold spaces, so a fully entered PIN is exactly four digits. It is zeroized
/// whenever it is cleared or replaced.
pub struct SessionStore {
    inner: Mutex<SessionState>,
}

struct SessionState {
    token: Option<String>,
    pin: Zeroizing<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionState {
                token: None,
                pin: Zeroizing::new(String::new()),
            }),
        }
    }

    /// Starts an authenticated session. Any previous PIN entry is discarded.
    pub async fn begin(&self, token: String) {
        let mut state = self.inner.lock().await;
        state.token = Some(token);
        state.pin = Zeroizing::new(String::new());
    }

    /// Ends the session, dropping token and PIN.
    pub async fn end(&self) {
        let mut state = self.inner.lock().await;
        state.token = None;
        state.pin = Zeroizing::new(String::new());
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.token.is_some()
    }

    /// Replaces the whole PIN entry, e.g. from a single masked input.
    pub async fn set_pin(&self, pin: &str) {
        let mut state = self.inner.lock().await;
        state.pin = Zeroizing::new(pin.to_owned());
    }

    /// Sets or clears one digit box. Out-of-range indexes and non-digit
    /// characters are ignored, matching the UI's per-keystroke filtering.
    pub async fn set_pin_digit(&self, index: usize, digit: Option<char>) {
        if index >= PIN_LEN {
            return;
        }
        if let Some(d) = digit {
            if !d.is_ascii_digit() {
                return;
            }
        }
        let mut state = self.inner.lock().await;
        let mut buffer: Vec<char> = state.pin.chars().collect();
        buffer.resize(PIN_LEN, ' ');
        buffer[index] = digit.unwrap_or(' ');
        let rendered: String = buffer.into_iter().collect();
        state.pin = Zeroizing::new(rendered.trim_end().to_owned());
    }

    pub async fn pin(&self) -> String {
        self.inner.lock().await.pin.to_string()
    }

    pub async fn clear_pin(&self) {
        let mut state = self.inner.lock().await;
        state.pin = Zeroizing::new(String::new());
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
