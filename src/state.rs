#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SessionState {
    Loading,       // Preloading the first images
    Showing,       // One image on screen, moving along its Ken-Burns path
    Transitioning, // Blending from the current image into the next one
    Empty,         // Nothing to show at all
    Error,         // Every image was skipped after repeated decode failures
}

impl SessionState {
    /// Empty and Error halt every timer until the playlist is reloaded.
    pub fn is_absorbing(self) -> bool {
        matches!(self, Self::Empty | Self::Error)
    }
}
