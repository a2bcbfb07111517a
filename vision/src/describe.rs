//! Structured description of a reference clothing image.
//!
//! The analyzer asks the vision model for complementary items plus the
//! category and gender of the pictured item, and validates the structure
//! of what comes back. The category vocabulary is open: a value outside
//! the allowed set is surfaced as a warning, not silently accepted and
//! not an error.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{ChatClient, extract_json};
use crate::error::{Result, VisionError};
use crate::image::ImageData;

/// Target audience of a catalog or analyzed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Men,
    Women,
    Boys,
    Girls,
    Unisex,
}

impl Gender {
    /// Parse the fixed enumeration; anything else is a contract violation.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Men" => Some(Self::Men),
            "Women" => Some(Self::Women),
            "Boys" => Some(Self::Boys),
            "Girls" => Some(Self::Girls),
            "Unisex" => Some(Self::Unisex),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
            Self::Boys => "Boys",
            Self::Girls => "Girls",
            Self::Unisex => "Unisex",
        }
    }

    /// Whether items for `self` can be worn with items for `other`.
    ///
    /// Unisex is compatible with everything; otherwise the audiences must
    /// match exactly.
    pub fn is_compatible_with(self, other: Gender) -> bool {
        self == other || self == Self::Unisex || other == Self::Unisex
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal findings attached to an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisWarning {
    /// The model proposed a category outside the allowed set.
    CategoryOutsideAllowed { category: String },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryOutsideAllowed { category } => {
                write!(f, "category {category:?} is not in the allowed set")
            }
        }
    }
}

/// Structured result of describing a reference image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemAnalysis {
    /// Complementary item descriptions, in model order.
    pub items: Vec<String>,

    /// Category of the pictured item.
    pub category: String,

    /// Audience of the pictured item.
    pub gender: Gender,

    /// Validation findings the caller should surface.
    pub warnings: Vec<AnalysisWarning>,
}

/// Capability: describe a reference image as structured attributes.
#[async_trait]
pub trait ItemAnalyzer: Send + Sync {
    /// Analyze `image`, constraining the category to `allowed_categories`.
    async fn analyze(
        &self,
        image: &ImageData,
        allowed_categories: &[String],
    ) -> Result<ItemAnalysis>;
}

/// [`ItemAnalyzer`] backed by an OpenAI vision model.
pub struct OpenAiAnalyzer {
    client: ChatClient,
}

impl OpenAiAnalyzer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    fn prompt(allowed_categories: &[String]) -> String {
        format!(
            "Given an image of an item of clothing, suggest 3 to 5 items that \
             would go well with it in an outfit. Describe each suggestion as a \
             short item title a shopper would search for, without repeating the \
             pictured item itself. Also determine the category and the target \
             audience of the pictured item.\n\
             Respond with a single JSON object and nothing else:\n\
             {{\"items\": [\"<title>\", ...], \"category\": \"<category>\", \
             \"gender\": \"<gender>\"}}\n\
             category must be one of: {}.\n\
             gender must be one of: Men, Women, Boys, Girls, Unisex.",
            allowed_categories.join(", ")
        )
    }
}

#[async_trait]
impl ItemAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        image: &ImageData,
        allowed_categories: &[String],
    ) -> Result<ItemAnalysis> {
        let parts = vec![
            ChatClient::text_part(Self::prompt(allowed_categories)),
            ChatClient::image_part(image),
        ];

        let content = self.client.complete(parts).await?;
        let analysis = parse_analysis(&content, allowed_categories)?;

        info!(
            items = analysis.items.len(),
            category = %analysis.category,
            gender = %analysis.gender,
            "analyzed reference image"
        );
        Ok(analysis)
    }
}

/// Validate raw model content into an [`ItemAnalysis`].
pub fn parse_analysis(content: &str, allowed_categories: &[String]) -> Result<ItemAnalysis> {
    let value = extract_json(content)?;
    let wire: AnalysisWire = serde_json::from_value(value)
        .map_err(|e| VisionError::MalformedResponse(format!("analysis shape: {e}")))?;

    let gender = Gender::parse(&wire.gender).ok_or_else(|| {
        VisionError::MalformedResponse(format!("gender {:?} is not in the enumeration", wire.gender))
    })?;

    let mut warnings = Vec::new();
    if !allowed_categories.contains(&wire.category) {
        warn!(
            category = %wire.category,
            "model proposed a category outside the allowed set"
        );
        warnings.push(AnalysisWarning::CategoryOutsideAllowed {
            category: wire.category.clone(),
        });
    }

    Ok(ItemAnalysis {
        items: wire.items,
        category: wire.category,
        gender,
        warnings,
    })
}

#[derive(Debug, Deserialize)]
struct AnalysisWire {
    items: Vec<String>,
    category: String,
    gender: String,
}
