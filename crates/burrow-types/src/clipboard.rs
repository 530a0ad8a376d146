use serde::{Deserialize, Serialize};

/// Pending intent of the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardMode {
    /// Nothing staged.
    #[default]
    None,
    Copy,
    Cut,
}

impl std::fmt::Display for ClipboardMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardMode::None => write!(f, "none"),
            ClipboardMode::Copy => write!(f, "copy"),
            ClipboardMode::Cut => write!(f, "cut"),
        }
    }
}
