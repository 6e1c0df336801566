use std::path::PathBuf;

/// Requests from the display surface, consumed once per loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    TogglePause,
    /// Advance right away, even mid-animation.
    AdvanceNow,
    Resize { width: f64, height: f64 },
    OpenSettings,
    SwitchProfile(String),
    Close,
}

/// Notifications for whoever drives the session (window, tray, menus).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    Closed,
    PauseChanged { paused: bool },
    SettingsRequested { profile: String },
    SwitchProfileRequested { profile: String },
    ImageSkipped { path: PathBuf },
}
