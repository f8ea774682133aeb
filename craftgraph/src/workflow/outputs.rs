//! Phase-scoped outputs written by the goal, concept and assembly nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::ImageArtifact;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    pub statement: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub audience: String,
}

/// Candidate product idea. Safety fields are filled by evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub score: Option<f32>,
    /// `Some(false)` means vetoed; such an option is never selected.
    #[serde(default)]
    pub safety_check: Option<bool>,
    #[serde(default)]
    pub safety_notes: Vec<String>,
}

impl ProductOption {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            materials: Vec::new(),
            steps: Vec::new(),
            difficulty: "easy".to_string(),
            score: None,
            safety_check: None,
            safety_notes: Vec::new(),
        }
    }

    pub fn is_safe(&self) -> bool {
        self.safety_check == Some(true)
    }

    /// Lowercased title, description and materials, for hazard scanning.
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.description);
        for m in &self.materials {
            text.push(' ');
            text.push_str(m);
        }
        text.to_lowercase()
    }
}

/// One concept image slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptVariant {
    pub index: usize,
    pub style: String,
    pub prompt: String,
    /// `None` until `image_generate` has processed this variant.
    pub image: Option<ImageArtifact>,
}

impl ConceptVariant {
    pub fn is_pending(&self) -> bool {
        self.image.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub item: String,
    pub quantity: u32,
    pub material: String,
    pub reused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityReport {
    pub items_reused: u32,
    pub materials: Vec<String>,
    pub estimated_waste_diverted_grams: u32,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPackage {
    pub title: String,
    pub summary: String,
    pub artifact_type: String,
    pub bill_of_materials: Vec<BillItem>,
    pub instructions: Vec<String>,
    pub sustainability: SustainabilityReport,
    pub concept_images: usize,
    pub placeholder_images: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub filename: String,
    pub format: String,
    /// Pretty-printed JSON of the package.
    pub document: String,
    pub markdown: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAnalytics {
    pub duration_secs: i64,
    pub ingredient_count: usize,
    pub mean_confidence: f32,
    pub clarification_rounds: u32,
    pub choice_regenerations: u32,
    pub error_count: usize,
    pub placeholder_images: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareCard {
    pub slug: String,
    pub caption: String,
    pub hashtags: Vec<String>,
}
