//! Output Modalities
//!
//! The target content type a session is currently aimed at. Every epoch
//! token and every generation error slot is scoped to one of these.

use serde::{Deserialize, Serialize};

/// Supported output modalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Image,
    ImageToImage,
    Story,
    Video,
    VideoMultiframe,
    Audio,
    Comic,
}

impl Modality {
    /// Whether generation for this modality produces images via the
    /// best-effort multi-attempt path.
    pub fn is_image_kind(&self) -> bool {
        matches!(self, Modality::Image | Modality::ImageToImage)
    }

    /// Whether generation for this modality produces a single text artifact.
    pub fn is_text_kind(&self) -> bool {
        matches!(self, Modality::Story | Modality::Comic)
    }

    /// Whether generation for this modality produces a video artifact.
    pub fn is_video_kind(&self) -> bool {
        matches!(self, Modality::Video | Modality::VideoMultiframe)
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::Image => write!(f, "image"),
            Modality::ImageToImage => write!(f, "image_to_image"),
            Modality::Story => write!(f, "story"),
            Modality::Video => write!(f, "video"),
            Modality::VideoMultiframe => write!(f, "video_multiframe"),
            Modality::Audio => write!(f, "audio"),
            Modality::Comic => write!(f, "comic"),
        }
    }
}

/// Sub-mode for audio generation: narrated speech or composed music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    Speech,
    Music,
}

impl Default for AudioMode {
    fn default() -> Self {
        Self::Speech
    }
}
