use pf_profile::{SessionSnapshot, SessionState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    SignedOut,
    Loading,
    SignedIn,
    Offline,
}

impl SessionStatus {
    pub fn from_snapshot(snapshot: &SessionSnapshot, offline: bool) -> Self {
        match snapshot.state() {
            SessionState::Unauthenticated => SessionStatus::SignedOut,
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Authenticated(_) if offline => SessionStatus::Offline,
            SessionState::Authenticated(_) => SessionStatus::SignedIn,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SessionStatus::SignedOut => "Signed out",
            SessionStatus::Loading => "Loading",
            SessionStatus::SignedIn => "Signed in",
            SessionStatus::Offline => "Signed in (offline)",
        }
    }

    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            SessionStatus::SignedOut => (239, 68, 68), // Red
            SessionStatus::Loading => (234, 179, 8),   // Yellow
            SessionStatus::SignedIn => (34, 197, 94),  // Green
            SessionStatus::Offline => (59, 130, 246),  // Blue
        }
    }

    /// Label wrapped in a 24-bit ANSI color
    pub fn painted(&self) -> String {
        let (r, g, b) = self.color();
        format!("\x1b[38;2;{r};{g};{b}m{}\x1b[0m", self.label())
    }
}
