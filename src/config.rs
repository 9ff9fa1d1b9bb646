use serde::{Deserialize, Serialize};

use crate::foundation::error::{MemeError, MemeResult};

/// Clip shape for the avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarShape {
    #[default]
    Circle,
    /// Rounded square (corner radius 20).
    Square,
}

/// Periodic avatar motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationType {
    None,
    #[default]
    Breathe,
    Wave,
    Bounce,
    Slide,
}

impl AnimationType {
    pub const ALL: [AnimationType; 5] = [
        AnimationType::None,
        AnimationType::Breathe,
        AnimationType::Wave,
        AnimationType::Bounce,
        AnimationType::Slide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnimationType::None => "none",
            AnimationType::Breathe => "breathe",
            AnimationType::Wave => "wave",
            AnimationType::Bounce => "bounce",
            AnimationType::Slide => "slide",
        }
    }

    /// Animations gated behind VIP access at export time.
    pub fn requires_vip(self) -> bool {
        matches!(self, AnimationType::Slide)
    }
}

impl std::fmt::Display for AnimationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnimationType {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnimationType::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MemeError::validation(format!("unknown animation type \"{s}\"")))
    }
}

/// Everything the renderer needs to paint a meme frame.
///
/// The JSON form uses the camelCase keys of saved browser configs, so existing history entries
/// load unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// `data:` URL or filesystem path of the avatar image. `None` draws the placeholder.
    pub avatar_image: Option<String>,
    pub avatar_shape: AvatarShape,
    pub show_avatar_border: bool,

    pub bubble_text: String,
    pub widget_text: String,
    pub show_widget: bool,
    #[serde(alias = "bubbleBackgroundColor")]
    pub bubble_bg_color: String,
    pub text_color: String,

    pub animation_type: AnimationType,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            avatar_image: None,
            avatar_shape: AvatarShape::Circle,
            show_avatar_border: true,
            bubble_text: "Hello World".to_owned(),
            widget_text: "Widget".to_owned(),
            show_widget: true,
            bubble_bg_color: "#ffffff".to_owned(),
            text_color: "#000000".to_owned(),
            animation_type: AnimationType::Breathe,
        }
    }
}

impl RenderConfig {
    pub fn from_json(s: &str) -> MemeResult<Self> {
        serde_json::from_str(s).map_err(|e| MemeError::validation(format!("invalid config: {e}")))
    }

    pub fn to_json_pretty(&self) -> MemeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MemeError::validation(format!("config serialization failed: {e}")))
    }

    /// History title: the first 20 characters of the bubble text.
    pub fn title(&self) -> String {
        let title: String = self.bubble_text.chars().take(20).collect();
        if title.is_empty() {
            "Untitled Meme".to_owned()
        } else {
            title
        }
    }
}
