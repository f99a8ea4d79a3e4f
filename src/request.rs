//! Request boundary
//!
//! What a caller hands to the pipeline, plus the defaults applied to the
//! optional profile fields. Validation happens here, before any outbound call.

use crate::error::{AdvisorError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use repair_advisor_common::{DEFAULT_BUDGET, DEFAULT_LOCATION, DEFAULT_SKILL_LEVEL};
use std::fmt;
use std::path::Path;

const FALLBACK_MEDIA_TYPE: &str = "image/jpeg";

/// Photo of the damaged area
#[derive(Clone, PartialEq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageInput")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("media_type", &self.media_type)
            .finish()
    }
}

impl ImageInput {
    pub fn from_bytes(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Read an image file; the media type comes from the content, then the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AdvisorError::FileNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| AdvisorError::ImageLoad(format!("{}: {}", path.display(), e)))?;
        let media_type = detect_media_type(&bytes, Some(path));

        Ok(Self { bytes, media_type })
    }

    /// Accepts `data:<media type>;base64,<payload>` or a bare base64 payload
    pub fn from_data_url(input: &str) -> Result<Self> {
        let input = input.trim();

        let (declared, payload) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    AdvisorError::InvalidRequest("image data URL has no payload".into())
                })?;
                let media_type = header.strip_suffix(";base64").ok_or_else(|| {
                    AdvisorError::InvalidRequest("image data URL must be base64 encoded".into())
                })?;
                (Some(media_type), payload)
            }
            None => (None, input),
        };

        let compact: String = payload.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| AdvisorError::InvalidRequest(format!("image is not valid base64: {}", e)))?;

        let media_type = match declared {
            Some(mt) if !mt.is_empty() => mt.to_string(),
            _ => detect_media_type(&bytes, None),
        };

        Ok(Self { bytes, media_type })
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Sniff the media type from magic bytes, falling back to the file extension
pub fn detect_media_type(bytes: &[u8], path: Option<&Path>) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    let ext = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => FALLBACK_MEDIA_TYPE,
    }
    .to_string()
}

/// Values used when a request leaves a profile field out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    pub skill_level: String,
    pub budget: String,
    pub location: String,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            skill_level: DEFAULT_SKILL_LEVEL.into(),
            budget: DEFAULT_BUDGET.into(),
            location: DEFAULT_LOCATION.into(),
        }
    }
}

/// Profile fields after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairProfile {
    pub skill_level: String,
    pub budget: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairRequest {
    pub description: String,
    pub skill_level: Option<String>,
    pub budget_preference: Option<String>,
    pub location: Option<String>,
    pub image: Option<ImageInput>,
}

impl RepairRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_skill_level(mut self, skill_level: impl Into<String>) -> Self {
        self.skill_level = Some(skill_level.into());
        self
    }

    pub fn with_budget(mut self, budget: impl Into<String>) -> Self {
        self.budget_preference = Some(budget.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Blank or absent fields take the default
    pub fn profile(&self, defaults: &RequestDefaults) -> RepairProfile {
        RepairProfile {
            skill_level: resolve(&self.skill_level, &defaults.skill_level),
            budget: resolve(&self.budget_preference, &defaults.budget),
            location: resolve(&self.location, &defaults.location),
        }
    }

    /// Check required fields, returning the image on success
    pub fn validate(&self) -> Result<&ImageInput> {
        let mut missing = Vec::new();

        if self.description.trim().is_empty() {
            missing.push("description");
        }

        let image = self.image.as_ref().filter(|img| !img.is_empty());
        if image.is_none() {
            missing.push("image");
        }

        match image {
            Some(image) if missing.is_empty() => Ok(image),
            _ => Err(AdvisorError::InvalidRequest(format!(
                "missing required field(s): {}",
                missing.join(", ")
            ))),
        }
    }
}

fn resolve(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}
