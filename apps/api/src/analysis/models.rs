//! Profile input, form state, and the AnalysisResult record.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::analysis::fallback::FALLBACK_TIPS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("'{0}' is required")]
    MissingField(&'static str),

    #[error("unknown form field '{0}'")]
    UnknownField(String),

    #[error("unknown gender '{0}'")]
    UnknownGender(String),

    #[error("unknown skin type '{0}'")]
    UnknownSkinType(String),

    #[error("unknown skin concern '{0}'")]
    UnknownConcern(String),

    #[error("upload is not an image (detected '{0}')")]
    NotAnImage(String),

    #[error("malformed image data URI")]
    InvalidDataUri,
}

// ────────────────────────────────────────────────────────────────────────────
// Enumerated profile fields
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn id(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(ProfileError::UnknownGender(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkinType {
    Normal,
    Oily,
    Dry,
    Combination,
    Sensitive,
    AcneProne,
}

impl SkinType {
    pub const ALL: [SkinType; 6] = [
        SkinType::Normal,
        SkinType::Oily,
        SkinType::Dry,
        SkinType::Combination,
        SkinType::Sensitive,
        SkinType::AcneProne,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SkinType::Normal => "normal",
            SkinType::Oily => "oily",
            SkinType::Dry => "dry",
            SkinType::Combination => "combination",
            SkinType::Sensitive => "sensitive",
            SkinType::AcneProne => "acne-prone",
        }
    }
}

impl FromStr for SkinType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SkinType::ALL
            .into_iter()
            .find(|t| t.id() == wanted)
            .ok_or_else(|| ProfileError::UnknownSkinType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkinConcern {
    Acne,
    Pigmentation,
    Wrinkles,
    Redness,
    DarkCircles,
    UnevenTone,
}

impl SkinConcern {
    pub const ALL: [SkinConcern; 6] = [
        SkinConcern::Acne,
        SkinConcern::Pigmentation,
        SkinConcern::Wrinkles,
        SkinConcern::Redness,
        SkinConcern::DarkCircles,
        SkinConcern::UnevenTone,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SkinConcern::Acne => "acne",
            SkinConcern::Pigmentation => "pigmentation",
            SkinConcern::Wrinkles => "wrinkles",
            SkinConcern::Redness => "redness",
            SkinConcern::DarkCircles => "dark-circles",
            SkinConcern::UnevenTone => "uneven-tone",
        }
    }
}

impl FromStr for SkinConcern {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SkinConcern::ALL
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| ProfileError::UnknownConcern(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Image handling
// ────────────────────────────────────────────────────────────────────────────

/// A raw image attachment as selected by the user, not yet encoded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Resolves the MIME type from the declared content type, falling back to
    /// a guess from the file name. Only `image/*` is accepted.
    pub fn mime_type(&self) -> Result<String, ProfileError> {
        let declared = self
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .map(str::to_ascii_lowercase);

        let mime = declared
            .or_else(|| {
                self.file_name
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first())
                    .map(|m| m.essence_str().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if mime.starts_with("image/") {
            Ok(mime)
        } else {
            Err(ProfileError::NotAnImage(mime))
        }
    }
}

/// A `data:image/<subtype>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageDataUri(String);

impl ImageDataUri {
    pub fn encode(upload: &ImageUpload) -> Result<Self, ProfileError> {
        let mime = upload.mime_type()?;
        Ok(Self(format!(
            "data:{mime};base64,{}",
            STANDARD.encode(&upload.bytes)
        )))
    }

    pub fn parse(uri: &str) -> Result<Self, ProfileError> {
        let rest = uri.strip_prefix("data:").ok_or(ProfileError::InvalidDataUri)?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or(ProfileError::InvalidDataUri)?;
        if !mime.starts_with("image/") || mime.len() <= "image/".len() {
            return Err(ProfileError::NotAnImage(mime.to_string()));
        }
        STANDARD
            .decode(payload)
            .map_err(|_| ProfileError::InvalidDataUri)?;
        Ok(Self(uri.to_string()))
    }

    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(';'))
            .map(|(mime, _)| mime)
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ImageDataUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageDataUri::parse(&raw).map_err(de::Error::custom)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profile and form state
// ────────────────────────────────────────────────────────────────────────────

/// The user's self-reported skin profile as sent to the adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub age: String,
    pub gender: Option<Gender>,
    pub skin_type: Option<SkinType>,
    #[serde(default)]
    pub skin_concerns: Vec<SkinConcern>,
    #[serde(default)]
    pub goals: String,
    #[serde(default)]
    pub image: Option<ImageDataUri>,
}

impl Profile {
    /// Concern ids exactly as submitted on the form, in form order.
    pub fn concern_ids(&self) -> Vec<String> {
        self.skin_concerns
            .iter()
            .map(|c| c.id().to_string())
            .collect()
    }
}

/// Immutable copy of the form taken at submit time. The image is still raw;
/// the orchestrator encodes it before invoking the adapter.
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    pub profile: Profile,
    pub image: Option<ImageUpload>,
}

/// Mutable form state, edited field by field.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    name: String,
    age: String,
    gender: Option<Gender>,
    skin_type: Option<SkinType>,
    skin_concerns: Vec<SkinConcern>,
    goals: String,
    image: Option<ImageUpload>,
}

impl ProfileForm {
    /// Sets a text field by its form name. Blank enum values clear the field.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), ProfileError> {
        match field {
            "name" => self.name = value.to_string(),
            "age" => self.age = value.to_string(),
            "goals" => self.goals = value.to_string(),
            "gender" if value.trim().is_empty() => self.gender = None,
            "gender" => self.set_gender(value.parse()?),
            "skinType" if value.trim().is_empty() => self.skin_type = None,
            "skinType" => self.set_skin_type(value.parse()?),
            other => return Err(ProfileError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = Some(gender);
    }

    pub fn set_skin_type(&mut self, skin_type: SkinType) {
        self.skin_type = Some(skin_type);
    }

    /// Checking an already-checked concern is a no-op; order of first check is kept.
    pub fn toggle_concern(&mut self, concern: SkinConcern, checked: bool) {
        if checked {
            if !self.skin_concerns.contains(&concern) {
                self.skin_concerns.push(concern);
            }
        } else {
            self.skin_concerns.retain(|c| *c != concern);
        }
    }

    /// Rejects anything that does not resolve to an `image/*` MIME type,
    /// leaving the previous attachment in place.
    pub fn attach_image(&mut self, upload: ImageUpload) -> Result<(), ProfileError> {
        upload.mime_type()?;
        self.image = Some(upload);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    #[cfg(test)]
    pub fn concerns(&self) -> &[SkinConcern] {
        &self.skin_concerns
    }

    /// Copies the current form into an immutable snapshot.
    /// Name and age are required, as on the input form.
    pub fn snapshot(&self) -> Result<ProfileSnapshot, ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::MissingField("name"));
        }
        if self.age.trim().is_empty() {
            return Err(ProfileError::MissingField("age"));
        }

        Ok(ProfileSnapshot {
            profile: Profile {
                name: self.name.clone(),
                age: self.age.clone(),
                gender: self.gender,
                skin_type: self.skin_type,
                skin_concerns: self.skin_concerns.clone(),
                goals: self.goals.clone(),
                image: None,
            },
            image: self.image.clone(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AnalysisResult
// ────────────────────────────────────────────────────────────────────────────

/// A single routine step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step: String,
    pub product: String,
    #[serde(default)]
    pub description: String,
}

impl Step {
    pub fn new(step: &str, product: &str, description: &str) -> Self {
        Self {
            step: step.to_string(),
            product: product.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Step>,
}

/// The structured skincare analysis shown on the results surface.
///
/// Wire names are camelCase. Scores are clamped into 0..=100 on the way in and
/// absent arrays become empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub skin_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub concerns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub morning_routine: Routine,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evening_routine: Routine,
    #[serde(deserialize_with = "deserialize_score")]
    pub hydration_score: u8,
    #[serde(deserialize_with = "deserialize_score")]
    pub oiliness_score: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tips: Vec<String>,
}

impl AnalysisResult {
    /// Restores the invariants deserialization alone cannot guarantee.
    pub fn normalized(mut self) -> Self {
        self.tips.retain(|tip| !tip.trim().is_empty());
        if self.tips.is_empty() {
            self.tips = FALLBACK_TIPS.iter().map(|t| t.to_string()).collect();
        }
        self
    }

    #[cfg(test)]
    pub fn is_well_formed(&self) -> bool {
        self.hydration_score <= 100 && self.oiliness_score <= 100 && !self.tips.is_empty()
    }
}

pub const MAX_SCORE: u8 = 100;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts integers, floats, and numeric strings; rounds and clamps to 0..=100.
fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let number = match &raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| de::Error::custom(ScoreError(raw.to_string())))?;

    Ok(number.round().clamp(0.0, f64::from(MAX_SCORE)) as u8)
}

struct ScoreError(String);

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "score must be a number between 0 and 100, got {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn png_upload() -> ImageUpload {
        ImageUpload {
            file_name: Some("face.png".to_string()),
            content_type: None,
            bytes: Bytes::from_static(&[0x89, b'P', b'N', b'G']),
        }
    }

    #[test]
    fn test_skin_type_parses_form_values() {
        assert_eq!("acne-prone".parse::<SkinType>().unwrap(), SkinType::AcneProne);
        assert_eq!("Oily".parse::<SkinType>().unwrap(), SkinType::Oily);
        assert!(matches!(
            "leathery".parse::<SkinType>(),
            Err(ProfileError::UnknownSkinType(_))
        ));
    }

    #[test]
    fn test_concern_serde_uses_kebab_ids() {
        let concern: SkinConcern = serde_json::from_str(r#""dark-circles""#).unwrap();
        assert_eq!(concern, SkinConcern::DarkCircles);
        assert_eq!(concern.id(), "dark-circles");
    }

    #[test]
    fn test_toggle_concern_never_duplicates() {
        let mut form = ProfileForm::default();
        form.toggle_concern(SkinConcern::Acne, true);
        form.toggle_concern(SkinConcern::Redness, true);
        form.toggle_concern(SkinConcern::Acne, true);
        assert_eq!(form.concerns(), &[SkinConcern::Acne, SkinConcern::Redness]);

        form.toggle_concern(SkinConcern::Acne, false);
        assert_eq!(form.concerns(), &[SkinConcern::Redness]);
    }

    #[test]
    fn test_set_field_rejects_unknown_values() {
        let mut form = ProfileForm::default();
        assert!(form.set_field("gender", "female").is_ok());
        assert!(form.set_field("gender", "robot").is_err());
        assert!(matches!(
            form.set_field("favouriteColour", "blue"),
            Err(ProfileError::UnknownField(_))
        ));
    }

    #[test]
    fn test_snapshot_requires_name_and_age() {
        let mut form = ProfileForm::default();
        assert_eq!(form.snapshot().unwrap_err(), ProfileError::MissingField("name"));
        form.set_field("name", "Asha").unwrap();
        assert_eq!(form.snapshot().unwrap_err(), ProfileError::MissingField("age"));
        form.set_field("age", "29").unwrap();
        assert!(form.snapshot().is_ok());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut form = ProfileForm::default();
        form.set_field("name", "Asha").unwrap();
        form.set_field("age", "29").unwrap();
        form.toggle_concern(SkinConcern::Acne, true);

        let snapshot = form.snapshot().unwrap();
        form.set_field("name", "Someone Else").unwrap();
        form.toggle_concern(SkinConcern::Wrinkles, true);

        assert_eq!(snapshot.profile.name, "Asha");
        assert_eq!(snapshot.profile.skin_concerns, vec![SkinConcern::Acne]);
    }

    #[test]
    fn test_image_mime_guessed_from_file_name() {
        assert_eq!(png_upload().mime_type().unwrap(), "image/png");
    }

    #[test]
    fn test_non_image_upload_rejected() {
        let upload = ImageUpload {
            file_name: Some("notes.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF"),
        };
        assert!(matches!(
            ImageDataUri::encode(&upload),
            Err(ProfileError::NotAnImage(_))
        ));
    }

    #[test]
    fn test_form_refuses_non_image_attachment() {
        let mut form = ProfileForm::default();
        form.attach_image(png_upload()).unwrap();

        let pdf = ImageUpload {
            file_name: Some("x.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            bytes: Bytes::from_static(b"%PDF"),
        };
        assert_eq!(
            form.attach_image(pdf).unwrap_err(),
            ProfileError::NotAnImage("application/pdf".to_string())
        );

        form.set_field("name", "Asha").unwrap();
        form.set_field("age", "29").unwrap();
        let snapshot = form.snapshot().unwrap();
        assert_eq!(snapshot.image.unwrap().file_name.as_deref(), Some("face.png"));
    }

    #[test]
    fn test_data_uri_encoding_is_parseable() {
        let uri = ImageDataUri::encode(&png_upload()).unwrap();
        assert!(uri.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(uri.mime_type(), "image/png");
        assert_eq!(ImageDataUri::parse(uri.as_str()).unwrap(), uri);
    }

    #[test]
    fn test_data_uri_parse_rejects_bad_payloads() {
        assert!(ImageDataUri::parse("data:image/png;base64,@@@").is_err());
        assert!(ImageDataUri::parse("data:text/plain;base64,aGk=").is_err());
        assert!(ImageDataUri::parse("https://example.com/face.png").is_err());
    }

    #[test]
    fn test_scores_are_clamped_and_rounded() {
        let value = json!({
            "skinType": "Dry",
            "hydrationScore": 140,
            "oilinessScore": "32.6",
            "tips": ["Moisturise"]
        });
        let result: AnalysisResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.hydration_score, 100);
        assert_eq!(result.oiliness_score, 33);

        let negative: AnalysisResult = serde_json::from_value(json!({
            "skinType": "Dry",
            "hydrationScore": -5,
            "oilinessScore": 0
        }))
        .unwrap();
        assert_eq!(negative.hydration_score, 0);
    }

    #[test]
    fn test_non_numeric_score_fails_deserialization() {
        let result: Result<AnalysisResult, _> = serde_json::from_value(json!({
            "skinType": "Dry",
            "hydrationScore": "high",
            "oilinessScore": 20
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_and_null_arrays_become_empty() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "skinType": "Normal",
            "concerns": null,
            "eveningRoutine": {"steps": null},
            "hydrationScore": 50,
            "oilinessScore": 50
        }))
        .unwrap();
        assert!(result.concerns.is_empty());
        assert!(result.morning_routine.steps.is_empty());
        assert!(result.evening_routine.steps.is_empty());
    }

    #[test]
    fn test_normalized_fills_empty_tips() {
        let result: AnalysisResult = serde_json::from_value(json!({
            "skinType": "Normal",
            "hydrationScore": 50,
            "oilinessScore": 50,
            "tips": ["   "]
        }))
        .unwrap();
        let result = result.normalized();
        assert_eq!(result.tips.len(), FALLBACK_TIPS.len());
        assert!(result.is_well_formed());
    }
}
