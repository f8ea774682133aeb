//! Ingredients: the raw materials a workflow starts from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Where an ingredient's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientSource {
    User,
    Extracted,
    Clarified,
    Derived,
}

/// Coarse role an ingredient plays in a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Container,
    Fastener,
    Decorative,
    Tool,
    Other,
}

impl Category {
    /// Categories every build needs at least one member of.
    pub const ESSENTIAL: [Category; 2] = [Category::Container, Category::Fastener];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Container => "container",
            Category::Fastener => "fastener",
            Category::Decorative => "decorative",
            Category::Tool => "tool",
            Category::Other => "other",
        }
    }

    /// Case-insensitive parse of a category name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "container" => Some(Category::Container),
            "fastener" => Some(Category::Fastener),
            "decorative" => Some(Category::Decorative),
            "tool" => Some(Category::Tool),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required field of an ingredient, in the order they are asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientField {
    Name,
    Material,
    Size,
}

impl IngredientField {
    pub const ASK_ORDER: [IngredientField; 3] = [
        IngredientField::Name,
        IngredientField::Material,
        IngredientField::Size,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IngredientField::Name => "name",
            IngredientField::Material => "material",
            IngredientField::Size => "size",
        }
    }
}

impl fmt::Display for IngredientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn clamped_confidence<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    let raw = f32::deserialize(d)?;
    Ok(clamp_confidence(raw))
}

/// Clamps into `[0, 1]`; NaN becomes 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One raw material. Optional fields stay `None` until known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: Option<String>,
    pub size: Option<String>,
    pub material: Option<String>,
    pub category: Option<Category>,
    pub condition: Option<String>,
    #[serde(deserialize_with = "clamped_confidence")]
    confidence: f32,
    pub source: IngredientSource,
    pub needs_clarification: bool,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

impl Ingredient {
    pub fn new(name: Option<String>, source: IngredientSource, confidence: f32) -> Self {
        let mut ingredient = Self {
            name,
            size: None,
            material: None,
            category: None,
            condition: None,
            confidence: clamp_confidence(confidence),
            source,
            needs_clarification: false,
        };
        ingredient.refresh_clarification_flag();
        ingredient
    }

    pub fn named(name: impl Into<String>, source: IngredientSource, confidence: f32) -> Self {
        Self::new(Some(name.into()), source, confidence)
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self.refresh_clarification_flag();
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self.refresh_clarification_flag();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn set_confidence(&mut self, value: f32) {
        self.confidence = clamp_confidence(value);
    }

    pub fn field(&self, field: IngredientField) -> Option<&str> {
        match field {
            IngredientField::Name => self.name.as_deref(),
            IngredientField::Material => self.material.as_deref(),
            IngredientField::Size => self.size.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: IngredientField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            IngredientField::Name => self.name = value,
            IngredientField::Material => self.material = value,
            IngredientField::Size => self.size = value,
        }
        self.refresh_clarification_flag();
    }

    pub fn has_field(&self, field: IngredientField) -> bool {
        match field {
            IngredientField::Name => present(&self.name),
            IngredientField::Material => present(&self.material),
            IngredientField::Size => present(&self.size),
        }
    }

    /// First required field still missing, in ask order.
    pub fn first_missing(&self) -> Option<IngredientField> {
        IngredientField::ASK_ORDER
            .into_iter()
            .find(|f| !self.has_field(*f))
    }

    /// Name, size and material all known and non-blank.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn refresh_clarification_flag(&mut self) {
        self.needs_clarification = !self.is_complete();
    }

    /// Name for prompts and questions.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("item")
    }
}
