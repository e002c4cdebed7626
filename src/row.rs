use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What on a slide needs to be animated
///
/// A row carries zero or more of these tags. Each tag has a stable key, used
/// in HTML forms and the JSON API, and a display label, used on the page and
/// in every export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationTarget {
    /// Nothing to animate
    #[default]
    None,

    /// Plain text
    Text,

    /// Text that sits inside a shape
    ShapeText,

    /// A shape on its own
    Shape,

    /// An image, an icon, or a code block
    ImageCode,

    /// A visual effect
    Effect,

    /// A custom animation has to be produced for this page
    AnimationNeeded,

    /// Anything else
    Other,
}

impl AnimationTarget {
    /// Every tag, in the order the form lists them
    pub const ALL: [AnimationTarget; 8] = [
        AnimationTarget::None,
        AnimationTarget::Text,
        AnimationTarget::ShapeText,
        AnimationTarget::Shape,
        AnimationTarget::ImageCode,
        AnimationTarget::Effect,
        AnimationTarget::AnimationNeeded,
        AnimationTarget::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AnimationTarget::None => "none",
            AnimationTarget::Text => "text",
            AnimationTarget::ShapeText => "shape_text",
            AnimationTarget::Shape => "shape",
            AnimationTarget::ImageCode => "image_code",
            AnimationTarget::Effect => "effect",
            AnimationTarget::AnimationNeeded => "animation_needed",
            AnimationTarget::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnimationTarget::None => "⛔ 없음",
            AnimationTarget::Text => "🔠 텍스트",
            AnimationTarget::ShapeText => "🆚 도형을 포함한 텍스트",
            AnimationTarget::Shape => "🟪 도형",
            AnimationTarget::ImageCode => "🖼️ 이미지(아이콘)/코드",
            AnimationTarget::Effect => "✨ 효과",
            AnimationTarget::AnimationNeeded => "👩‍🎨 애니메이션 제작 필요",
            AnimationTarget::Other => "🎸 기타",
        }
    }

    /// Look a tag up by its key or its display label
    pub fn parse(input: &str) -> Result<Self, RowError> {
        let input = input.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.key() == input || t.label() == input)
            .ok_or_else(|| RowError::UnknownTarget(input.to_string()))
    }
}

impl fmt::Display for AnimationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised while turning raw input into a [`ScriptRow`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("page number must be a whole number, got {0:?}")]
    InvalidPageNumber(String),

    #[error("unknown animation target {0:?}")]
    UnknownTarget(String),

    #[error("{field} is {len} characters long, the limit is {MAX_TEXT_CHARS}")]
    TooLong { field: &'static str, len: usize },
}

/// Longest text a spreadsheet cell can hold
pub const MAX_TEXT_CHARS: usize = 32_767;

fn check_length(field: &'static str, text: &str) -> Result<(), RowError> {
    let len = text.chars().count();
    if len > MAX_TEXT_CHARS {
        return Err(RowError::TooLong { field, len });
    }
    Ok(())
}

/// One page worth of lecture script: the unit of entry and export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRow {
    /// Slide page number; blank in the form means no page number
    pub page_number: Option<i64>,

    /// Animation tags for the page, deduplicated, in selection order
    pub animation_targets: Vec<AnimationTarget>,

    /// Free text describing the effect to apply
    pub effect_description: String,

    /// Narration for the page
    pub script: String,
}

impl ScriptRow {
    /// Build a row from raw form input
    ///
    /// # Arguments
    /// * `page_number` - Page number text; blank means no page number
    /// * `targets` - Tag keys or labels, in selection order
    /// * `effect_description` - Effect text, kept as entered
    /// * `script` - Script text, kept as entered
    ///
    /// # Errors
    /// * `RowError::InvalidPageNumber` if the page number is not an integer
    /// * `RowError::UnknownTarget` for the first tag that is not recognised
    /// * `RowError::TooLong` if the effect or script exceeds [`MAX_TEXT_CHARS`]
    pub fn from_input<S: AsRef<str>>(
        page_number: &str,
        targets: &[S],
        effect_description: &str,
        script: &str,
    ) -> Result<Self, RowError> {
        let page_number = parse_page_number(page_number)?;
        Self::new(page_number, targets, effect_description, script)
    }

    /// Build a row from an already-parsed page number
    ///
    /// # Errors
    /// * `RowError::UnknownTarget` for the first tag that is not recognised
    /// * `RowError::TooLong` if the effect or script exceeds [`MAX_TEXT_CHARS`]
    pub fn new<S: AsRef<str>>(
        page_number: Option<i64>,
        targets: &[S],
        effect_description: &str,
        script: &str,
    ) -> Result<Self, RowError> {
        check_length("effect description", effect_description)?;
        check_length("script", script)?;

        let mut animation_targets = Vec::with_capacity(targets.len());
        for raw in targets {
            let target = AnimationTarget::parse(raw.as_ref())?;
            if !animation_targets.contains(&target) {
                animation_targets.push(target);
            }
        }

        Ok(ScriptRow {
            page_number,
            animation_targets,
            effect_description: effect_description.to_string(),
            script: script.to_string(),
        })
    }

    /// Page number as export text, empty when unset
    pub fn page_text(&self) -> String {
        self.page_number.map(|p| p.to_string()).unwrap_or_default()
    }

    /// Tag labels joined with `", "`
    pub fn targets_text(&self) -> String {
        self.animation_targets
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The four cell values in column order
    pub fn cells(&self) -> [String; 4] {
        [
            self.page_text(),
            self.targets_text(),
            self.effect_description.clone(),
            self.script.clone(),
        ]
    }
}

fn parse_page_number(raw: &str) -> Result<Option<i64>, RowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| RowError::InvalidPageNumber(raw.to_string()))
}
