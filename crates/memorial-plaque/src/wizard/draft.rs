//! The in-progress order record and the patches that edit it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{MaterialType, SizeId};
use crate::error::{Error, Result};
use crate::qr::slugify;

/// Placeholder shown on the plaque before a name is entered.
pub const NAME_PLACEHOLDER: &str = "Full Name";

/// Placeholder shown on the plaque before memorial words are entered.
pub const WORDS_PLACEHOLDER: &str = "Memorial Words";

/// Outline of the plaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Square with slightly rounded corners.
    Square,
    /// Rectangle with slightly rounded corners.
    Rectangle,
    /// Generously rounded corners.
    Rounded,
}

/// Engraving color for the QR code or the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaqueColor {
    /// Gold fill.
    Gold,
    /// Silver fill.
    Silver,
    /// Black fill.
    Black,
    /// White fill.
    White,
}

/// Who may view the memorial page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    /// Anyone with the link.
    #[default]
    Public,
    /// Family members only.
    Private,
    /// Visitors must supply a password.
    PasswordProtected,
}

impl Shape {
    /// Every shape.
    pub const ALL: [Self; 3] = [Self::Square, Self::Rectangle, Self::Rounded];

    /// Stored name of the shape.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "square",
            Self::Rectangle => "rectangle",
            Self::Rounded => "rounded",
        }
    }
}

impl PlaqueColor {
    /// Every color.
    pub const ALL: [Self; 4] = [Self::Gold, Self::Silver, Self::Black, Self::White];

    /// Stored name of the color.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl Privacy {
    /// Every privacy mode.
    pub const ALL: [Self; 3] = [Self::Public, Self::Private, Self::PasswordProtected];

    /// Stored name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::PasswordProtected => "password_protected",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PlaqueColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::invalid_value("shape", s))
    }
}

impl FromStr for PlaqueColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::invalid_value("color", s))
    }
}

impl FromStr for Privacy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::invalid_value("privacy", s))
    }
}

/// A partially filled order.
///
/// Drafts are only built through [`OrderDraft::new`] and [`apply_patch`], which
/// keeps blank strings out of the record: a field is either unset or holds
/// non-blank text. The plaque's text lines are derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    material: Option<MaterialType>,
    size: Option<SizeId>,
    shape: Option<Shape>,
    qr_color: Option<PlaqueColor>,
    text_color: Option<PlaqueColor>,
    font_choice: Option<String>,
    full_name: Option<String>,
    nick_name: Option<String>,
    birth_month_year: Option<String>,
    death_month_year: Option<String>,
    few_words: Option<String>,
    privacy: Privacy,
}

/// A set of field edits to merge into a draft.
///
/// `None` leaves a field untouched. Supplying an empty or whitespace-only
/// string clears a text field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftPatch {
    /// Plaque material.
    pub material: Option<MaterialType>,
    /// Plaque size.
    pub size: Option<SizeId>,
    /// Plaque outline.
    pub shape: Option<Shape>,
    /// QR engraving color.
    pub qr_color: Option<PlaqueColor>,
    /// Text engraving color.
    pub text_color: Option<PlaqueColor>,
    /// Font id from the catalog.
    pub font_choice: Option<String>,
    /// Name of the person remembered.
    pub full_name: Option<String>,
    /// Nickname shown on the memorial page.
    pub nick_name: Option<String>,
    /// Birth period, free text.
    pub birth_month_year: Option<String>,
    /// Passing period, free text.
    pub death_month_year: Option<String>,
    /// Memorial message.
    pub few_words: Option<String>,
    /// Memorial page visibility.
    pub privacy: Option<Privacy>,
}

impl DraftPatch {
    /// Whether this patch edits the full name.
    #[must_use]
    pub fn touches_name(&self) -> bool {
        self.full_name.is_some()
    }
}

/// Merge `patch` into `draft`, returning the new draft.
#[must_use]
pub fn apply_patch(draft: &OrderDraft, patch: &DraftPatch) -> OrderDraft {
    fn text(current: &Option<String>, edit: &Option<String>) -> Option<String> {
        match edit {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.clone()),
            None => current.clone(),
        }
    }

    OrderDraft {
        material: patch.material.or(draft.material),
        size: patch.size.or(draft.size),
        shape: patch.shape.or(draft.shape),
        qr_color: patch.qr_color.or(draft.qr_color),
        text_color: patch.text_color.or(draft.text_color),
        font_choice: text(&draft.font_choice, &patch.font_choice),
        full_name: text(&draft.full_name, &patch.full_name),
        nick_name: text(&draft.nick_name, &patch.nick_name),
        birth_month_year: text(&draft.birth_month_year, &patch.birth_month_year),
        death_month_year: text(&draft.death_month_year, &patch.death_month_year),
        few_words: text(&draft.few_words, &patch.few_words),
        privacy: patch.privacy.unwrap_or(draft.privacy),
    }
}

impl OrderDraft {
    /// An empty draft with public privacy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for [`apply_patch`].
    #[must_use]
    pub fn patched(&self, patch: &DraftPatch) -> Self {
        apply_patch(self, patch)
    }

    /// Selected material.
    #[must_use]
    pub fn material(&self) -> Option<MaterialType> {
        self.material
    }

    /// Selected size.
    #[must_use]
    pub fn size(&self) -> Option<SizeId> {
        self.size
    }

    /// Selected shape.
    #[must_use]
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Selected QR color.
    #[must_use]
    pub fn qr_color(&self) -> Option<PlaqueColor> {
        self.qr_color
    }

    /// Selected text color.
    #[must_use]
    pub fn text_color(&self) -> Option<PlaqueColor> {
        self.text_color
    }

    /// Selected font id.
    #[must_use]
    pub fn font_choice(&self) -> Option<&str> {
        self.font_choice.as_deref()
    }

    /// Full name of the person remembered.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Nickname.
    #[must_use]
    pub fn nick_name(&self) -> Option<&str> {
        self.nick_name.as_deref()
    }

    /// Birth period.
    #[must_use]
    pub fn birth_month_year(&self) -> Option<&str> {
        self.birth_month_year.as_deref()
    }

    /// Passing period.
    #[must_use]
    pub fn death_month_year(&self) -> Option<&str> {
        self.death_month_year.as_deref()
    }

    /// Memorial message.
    #[must_use]
    pub fn few_words(&self) -> Option<&str> {
        self.few_words.as_deref()
    }

    /// Memorial page visibility.
    #[must_use]
    pub fn privacy(&self) -> Privacy {
        self.privacy
    }

    /// Lines engraved under the QR code.
    ///
    /// Always the name then the memorial words, each replaced by a
    /// placeholder while unset.
    #[must_use]
    pub fn text_lines(&self) -> Vec<String> {
        [
            self.full_name.as_deref().unwrap_or(NAME_PLACEHOLDER),
            self.few_words.as_deref().unwrap_or(WORDS_PLACEHOLDER),
        ]
        .into_iter()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
    }

    /// Memorial page slug derived from the full name, if any.
    #[must_use]
    pub fn slug(&self) -> Option<String> {
        self.full_name
            .as_deref()
            .map(slugify)
            .filter(|slug| !slug.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> DraftPatch {
        DraftPatch {
            full_name: Some(name.to_string()),
            ..DraftPatch::default()
        }
    }

    #[test]
    fn test_new_draft_defaults_to_public() {
        let draft = OrderDraft::new();
        assert_eq!(draft.privacy(), Privacy::Public);
        assert!(draft.material().is_none());
        assert!(draft.full_name().is_none());
    }

    #[test]
    fn test_apply_patch_merges_shallowly() {
        let draft = OrderDraft::new().patched(&DraftPatch {
            material: Some(MaterialType::Brass),
            qr_color: Some(PlaqueColor::Gold),
            ..DraftPatch::default()
        });
        let draft = draft.patched(&DraftPatch {
            size: Some(SizeId::QrName),
            qr_color: Some(PlaqueColor::Black),
            ..DraftPatch::default()
        });

        assert_eq!(draft.material(), Some(MaterialType::Brass));
        assert_eq!(draft.size(), Some(SizeId::QrName));
        assert_eq!(draft.qr_color(), Some(PlaqueColor::Black));
    }

    #[test]
    fn test_apply_patch_is_pure() {
        let original = OrderDraft::new();
        let updated = apply_patch(&original, &named("Ada Lovelace"));
        assert!(original.full_name().is_none());
        assert_eq!(updated.full_name(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_blank_text_clears_field() {
        let draft = OrderDraft::new().patched(&named("Ada"));
        let cleared = draft.patched(&named("   "));
        assert!(cleared.full_name().is_none());
    }

    #[test]
    fn test_text_lines_use_placeholders() {
        let draft = OrderDraft::new();
        assert_eq!(draft.text_lines(), vec![NAME_PLACEHOLDER, WORDS_PLACEHOLDER]);

        let draft = draft.patched(&DraftPatch {
            full_name: Some("Grace Hopper".to_string()),
            few_words: Some("Forever curious".to_string()),
            ..DraftPatch::default()
        });
        assert_eq!(draft.text_lines(), vec!["Grace Hopper", "Forever curious"]);
    }

    #[test]
    fn test_slug_from_name() {
        let draft = OrderDraft::new().patched(&named("John O'Doe Jr."));
        assert_eq!(draft.slug().as_deref(), Some("john-o-doe-jr"));

        let draft = OrderDraft::new().patched(&named("!!!"));
        assert!(draft.slug().is_none());
    }

    #[test]
    fn test_patch_deserializes_from_json() {
        let patch: DraftPatch = serde_json::from_str(
            r#"{"material": "marble_white", "size": "qr_only_5x5", "qr_color": "silver", "privacy": "password_protected"}"#,
        )
        .unwrap();
        assert_eq!(patch.material, Some(MaterialType::MarbleWhite));
        assert_eq!(patch.size, Some(SizeId::QrOnly));
        assert_eq!(patch.qr_color, Some(PlaqueColor::Silver));
        assert_eq!(patch.privacy, Some(Privacy::PasswordProtected));
    }

    #[test]
    fn test_patch_rejects_text_lines() {
        let result: std::result::Result<DraftPatch, _> =
            serde_json::from_str(r#"{"text_lines": ["a", "b"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_enum_round_trip_through_str() {
        for shape in Shape::ALL {
            assert_eq!(shape.as_str().parse::<Shape>().unwrap(), shape);
        }
        for color in PlaqueColor::ALL {
            assert_eq!(color.as_str().parse::<PlaqueColor>().unwrap(), color);
        }
        for privacy in Privacy::ALL {
            assert_eq!(privacy.as_str().parse::<Privacy>().unwrap(), privacy);
        }
        assert!("oval".parse::<Shape>().is_err());
    }
}
