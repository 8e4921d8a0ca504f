use constants::customizer::DEFAULT_BASE_COLOUR;
use constants::paths::DEFAULT_DECAL_IMAGE;
use serde::{Deserialize, Serialize};

/// The two decal layers a garment can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecalKind {
    Logo,
    Full,
}

impl DecalKind {
    pub const ALL: [DecalKind; 2] = [DecalKind::Full, DecalKind::Logo];

    /// Convert string identifier to decal kind for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "logo" => Some(Self::Logo),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logo => "logo",
            Self::Full => "full",
        }
    }
}

/// Every user-editable customization parameter for the session.
///
/// Values are stored exactly as received. Colours and locators are not
/// validated here; a malformed value shows up later as a parse warning or a
/// failed texture load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizationState {
    pub intro_visible: bool,
    pub base_colour: String,
    pub logo_enabled: bool,
    pub full_enabled: bool,
    pub logo_image: String,
    pub full_image: String,
    /// Set when the latest `logo_image` came from a user upload. Only used to
    /// force the logo decal to be rebuilt.
    pub fresh_upload: bool,
}

impl Default for CustomizationState {
    fn default() -> Self {
        Self {
            intro_visible: true,
            base_colour: DEFAULT_BASE_COLOUR.to_string(),
            logo_enabled: false,
            full_enabled: false,
            logo_image: DEFAULT_DECAL_IMAGE.to_string(),
            full_image: DEFAULT_DECAL_IMAGE.to_string(),
            fresh_upload: false,
        }
    }
}
