//! Citizen ID card (CCCD) data models.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Display language for labels and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Vietnamese (the app's display language).
    #[default]
    Vi,
    /// English.
    En,
}

impl Locale {
    /// Parse a locale code such as "vi" or "en-US".
    pub fn from_str(s: &str) -> Option<Self> {
        let code = s.trim().to_lowercase();
        match code.split(['-', '_']).next().unwrap_or("") {
            "vi" => Some(Self::Vi),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// A named attribute printed on the ID card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentField {
    IdNumber,
    FullName,
    DateOfBirth,
    Sex,
    Nationality,
    PlaceOfOrigin,
    PlaceOfResidence,
    /// Present on the card but not part of the required set.
    DateOfExpiry,
}

impl DocumentField {
    /// Required fields in canonical order.
    pub const REQUIRED: [DocumentField; 7] = [
        DocumentField::IdNumber,
        DocumentField::FullName,
        DocumentField::DateOfBirth,
        DocumentField::Sex,
        DocumentField::Nationality,
        DocumentField::PlaceOfOrigin,
        DocumentField::PlaceOfResidence,
    ];

    /// Human-readable label shown to the user.
    pub fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Vi => match self {
                Self::IdNumber => "Số CCCD",
                Self::FullName => "Họ và tên",
                Self::DateOfBirth => "Ngày sinh",
                Self::Sex => "Giới tính",
                Self::Nationality => "Quốc tịch",
                Self::PlaceOfOrigin => "Quê quán",
                Self::PlaceOfResidence => "Nơi thường trú",
                Self::DateOfExpiry => "Có giá trị đến",
            },
            Locale::En => match self {
                Self::IdNumber => "ID number",
                Self::FullName => "Full name",
                Self::DateOfBirth => "Date of birth",
                Self::Sex => "Sex",
                Self::Nationality => "Nationality",
                Self::PlaceOfOrigin => "Place of origin",
                Self::PlaceOfResidence => "Place of residence",
                Self::DateOfExpiry => "Date of expiry",
            },
        }
    }

    /// Wire key used in serialized records.
    pub fn key(self) -> &'static str {
        match self {
            Self::IdNumber => "idNumber",
            Self::FullName => "fullName",
            Self::DateOfBirth => "dateOfBirth",
            Self::Sex => "sex",
            Self::Nationality => "nationality",
            Self::PlaceOfOrigin => "placeOfOrigin",
            Self::PlaceOfResidence => "placeOfResidence",
            Self::DateOfExpiry => "dateOfExpiry",
        }
    }

    pub fn is_required(self) -> bool {
        self != Self::DateOfExpiry
    }
}

impl fmt::Display for DocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Reference to a captured image on local storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(PathBuf);

impl ImageHandle {
    /// Create a handle from a path or a `file://` URI.
    pub fn new(uri: impl AsRef<str>) -> Self {
        let uri = uri.as_ref();
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        Self(PathBuf::from(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for ImageHandle {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Fields extracted from one capture attempt.
///
/// Every required field is always present. An empty string means the field
/// could not be found in the recognized text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDocumentRecord {
    pub id_number: String,
    pub full_name: String,
    pub date_of_birth: String,
    pub sex: String,
    pub nationality: String,
    pub place_of_origin: String,
    pub place_of_residence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_expiry: Option<String>,
}

impl PartialDocumentRecord {
    /// Value of a field. The expiry date reads as empty when absent.
    pub fn value(&self, field: DocumentField) -> &str {
        match field {
            DocumentField::IdNumber => &self.id_number,
            DocumentField::FullName => &self.full_name,
            DocumentField::DateOfBirth => &self.date_of_birth,
            DocumentField::Sex => &self.sex,
            DocumentField::Nationality => &self.nationality,
            DocumentField::PlaceOfOrigin => &self.place_of_origin,
            DocumentField::PlaceOfResidence => &self.place_of_residence,
            DocumentField::DateOfExpiry => self.date_of_expiry.as_deref().unwrap_or(""),
        }
    }

    /// Required fields whose value is empty, in canonical order.
    pub fn missing_fields(&self) -> Vec<DocumentField> {
        DocumentField::REQUIRED
            .into_iter()
            .filter(|f| self.value(*f).is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A validated ID card record, ready to hand to the confirmation screen.
///
/// Only obtainable through [`DocumentRecord::from_partial`], so every
/// required field is guaranteed non-empty. Deserialization goes through the
/// same check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UncheckedDocumentRecord")]
pub struct DocumentRecord {
    #[serde(flatten)]
    fields: PartialDocumentRecord,
    image: ImageHandle,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UncheckedDocumentRecord {
    #[serde(flatten)]
    fields: PartialDocumentRecord,
    image: ImageHandle,
}

impl TryFrom<UncheckedDocumentRecord> for DocumentRecord {
    type Error = ExtractionError;

    fn try_from(raw: UncheckedDocumentRecord) -> Result<Self, Self::Error> {
        Self::from_partial(raw.fields, raw.image, Locale::default())
    }
}

impl DocumentRecord {
    /// Promote a partial record captured from `image`.
    ///
    /// Fails with the labels of every empty required field.
    pub fn from_partial(
        fields: PartialDocumentRecord,
        image: ImageHandle,
        locale: Locale,
    ) -> Result<Self, ExtractionError> {
        let missing = fields.missing_fields();
        if !missing.is_empty() {
            return Err(ExtractionError::MissingFields(
                missing.iter().map(|f| f.label(locale).to_string()).collect(),
            ));
        }
        Ok(Self { fields, image })
    }

    pub fn id_number(&self) -> &str {
        &self.fields.id_number
    }

    pub fn full_name(&self) -> &str {
        &self.fields.full_name
    }

    pub fn date_of_birth(&self) -> &str {
        &self.fields.date_of_birth
    }

    pub fn sex(&self) -> &str {
        &self.fields.sex
    }

    pub fn nationality(&self) -> &str {
        &self.fields.nationality
    }

    pub fn place_of_origin(&self) -> &str {
        &self.fields.place_of_origin
    }

    pub fn place_of_residence(&self) -> &str {
        &self.fields.place_of_residence
    }

    pub fn date_of_expiry(&self) -> Option<&str> {
        self.fields.date_of_expiry.as_deref()
    }

    /// The image this record was extracted from.
    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn fields(&self) -> &PartialDocumentRecord {
        &self.fields
    }

    /// Label/value pairs for the confirmation screen, in canonical order.
    pub fn display_fields(&self, locale: Locale) -> Vec<(&'static str, &str)> {
        DocumentField::REQUIRED
            .iter()
            .map(|f| (f.label(locale), self.fields.value(*f)))
            .collect()
    }
}
