//! Generation Settings
//!
//! Per-modality knobs carried by the session and read by the generation
//! dispatcher when it builds the concrete remote request.

use serde::{Deserialize, Serialize};

use museboard_core::AudioMode;

/// Image generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSettings {
    /// How many images one generation action should aim for.
    #[serde(default = "default_image_count")]
    pub count: u32,
    /// Requested output size (e.g. "1024x1024").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Style hint forwarded verbatim to the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Base64-encoded reference images, used by image-to-image only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_images: Vec<String>,
}

fn default_image_count() -> u32 {
    4
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            count: default_image_count(),
            size: None,
            style: None,
            reference_images: Vec::new(),
        }
    }
}

/// Video generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

/// Audio generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default)]
    pub mode: AudioMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// All per-modality settings. Story and comic generation need no knobs
/// beyond the prompt itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(default)]
    pub video: VideoSettings,
    #[serde(default)]
    pub audio: AudioSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_count_default() {
        let settings: GenerationSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.image.count, 4);
        assert_eq!(settings.audio.mode, AudioMode::Speech);
    }
}
