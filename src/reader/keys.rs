/// Keyboard input understood by the reader view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKey {
    Next,
    Prev,
    ToggleFullscreen,
    Escape,
}

impl ReaderKey {
    /// Maps a key name as reported by the host; unknown keys are ignored.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowRight" | "Right" | "right" | "n" => Some(ReaderKey::Next),
            "ArrowLeft" | "Left" | "left" | "p" => Some(ReaderKey::Prev),
            "f" | "F" => Some(ReaderKey::ToggleFullscreen),
            "Escape" | "Esc" | "esc" => Some(ReaderKey::Escape),
            _ => None,
        }
    }
}
