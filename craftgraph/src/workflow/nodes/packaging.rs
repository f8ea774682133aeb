//! `packaging`: assemble the product package from everything collected so far.

use async_trait::async_trait;

use crate::workflow::executor::{ExecutorFault, NodeExecutor};
use crate::workflow::ingredient::IngredientSource;
use crate::workflow::keywords;
use crate::workflow::outputs::{BillItem, ProductPackage, SustainabilityReport};
use crate::workflow::state::{Phase, WorkflowState};
use crate::workflow::update::StateUpdate;

use super::PACKAGING;

const UNKNOWN_MATERIAL: &str = "unspecified";

fn default_instructions(title: &str) -> Vec<String> {
    vec![
        "Clean and dry every item before starting.".to_string(),
        "Lay out the materials and mark the cuts.".to_string(),
        format!("Assemble the {} following the concept images.", title.to_lowercase()),
        "Check every joint and finish the edges.".to_string(),
    ]
}

/// Deterministic package from `state`; defaults stand in for anything missing.
pub fn build_package(state: &WorkflowState) -> ProductPackage {
    let artifact_type = state
        .artifact_type
        .clone()
        .unwrap_or_else(|| "upcycled craft".to_string());
    let (title, description, steps) = match &state.selected_option {
        Some(option) => (
            option.title.clone(),
            option.description.clone(),
            option.steps.clone(),
        ),
        None => (
            format!("Upcycled {}", artifact_type),
            String::new(),
            Vec::new(),
        ),
    };
    let instructions = if steps.is_empty() {
        default_instructions(&title)
    } else {
        steps
    };

    let bill_of_materials: Vec<BillItem> = state
        .ingredients
        .iter()
        .map(|i| BillItem {
            item: i.label().to_string(),
            quantity: keywords::leading_quantity(i.label()),
            material: i
                .material
                .clone()
                .unwrap_or_else(|| UNKNOWN_MATERIAL.to_string()),
            reused: i.source != IngredientSource::Derived,
        })
        .collect();

    let mut materials: Vec<String> = bill_of_materials
        .iter()
        .map(|b| b.material.clone())
        .filter(|m| m != UNKNOWN_MATERIAL)
        .collect();
    materials.sort();
    materials.dedup();

    let reused: Vec<&BillItem> = bill_of_materials.iter().filter(|b| b.reused).collect();
    // Quantities are parsed from free text and may be arbitrarily large.
    let items_reused = reused
        .iter()
        .fold(0u32, |acc, b| acc.saturating_add(b.quantity));
    let estimated_waste_diverted_grams = reused.iter().fold(0u32, |acc, b| {
        acc.saturating_add(
            b.quantity
                .saturating_mul(keywords::typical_weight_grams(&b.material)),
        )
    });
    let mut notes = Vec::new();
    if bill_of_materials.iter().any(|b| !b.reused) {
        notes.push("Some parts have to be sourced; prefer second-hand.".to_string());
    }
    if let Some(option) = &state.selected_option {
        notes.extend(option.safety_notes.iter().cloned());
    }

    let concept_images = state
        .concept_variants
        .iter()
        .filter(|v| v.image.is_some())
        .count();
    let placeholder_images = state
        .concept_variants
        .iter()
        .filter(|v| v.image.as_ref().map(|i| i.placeholder).unwrap_or(true))
        .count();

    let summary = if description.is_empty() {
        state
            .goals
            .as_ref()
            .map(|g| g.statement.clone())
            .unwrap_or_else(|| format!("A {} made from reused materials.", artifact_type))
    } else {
        description
    };

    ProductPackage {
        title,
        summary,
        artifact_type,
        bill_of_materials,
        instructions,
        sustainability: SustainabilityReport {
            items_reused,
            materials,
            estimated_waste_diverted_grams,
            notes,
        },
        concept_images,
        placeholder_images,
    }
}

pub struct Packaging;

#[async_trait]
impl NodeExecutor for Packaging {
    fn id(&self) -> &'static str {
        PACKAGING
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        Ok(StateUpdate {
            phase: Some(Phase::OutputAssembly),
            final_package: Some(build_package(state)),
            ..StateUpdate::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ImageArtifact;
    use crate::workflow::ingredient::{Category, Ingredient};
    use crate::workflow::outputs::{ConceptVariant, ProductOption};

    fn state() -> WorkflowState {
        let mut s = WorkflowState::new("t", "3 plastic water bottles");
        s.ingredients = vec![
            Ingredient::named("3 plastic water bottles", IngredientSource::Extracted, 0.9)
                .with_material("plastic")
                .with_size("500 ml"),
            Ingredient::named("fastener", IngredientSource::Derived, 0.2)
                .with_category(Category::Fastener),
        ];
        s.artifact_type = Some("planter".into());
        s.concept_variants = vec![
            ConceptVariant {
                index: 0,
                style: "hero product shot".into(),
                prompt: "p".into(),
                image: Some(ImageArtifact::new("image/png", vec![1])),
            },
            ConceptVariant {
                index: 1,
                style: "in-use lifestyle scene".into(),
                prompt: "p".into(),
                image: Some(ImageArtifact::placeholder()),
            },
        ];
        s
    }

    /// **Scenario**: Bill of materials quantities, reuse flags and the waste estimate follow the ingredients.
    #[test]
    fn bill_and_sustainability() {
        let pkg = build_package(&state());
        assert_eq!(pkg.bill_of_materials.len(), 2);
        assert_eq!(pkg.bill_of_materials[0].quantity, 3);
        assert!(pkg.bill_of_materials[0].reused);
        assert!(!pkg.bill_of_materials[1].reused);
        assert_eq!(pkg.bill_of_materials[1].material, UNKNOWN_MATERIAL);
        assert_eq!(pkg.sustainability.items_reused, 3);
        assert_eq!(pkg.sustainability.estimated_waste_diverted_grams, 75);
        assert_eq!(pkg.sustainability.materials, vec!["plastic".to_string()]);
        assert_eq!(pkg.concept_images, 2);
        assert_eq!(pkg.placeholder_images, 1);
    }

    /// **Scenario**: Without a selected option the package still has a title and default instructions.
    #[test]
    fn defaults_without_selection() {
        let pkg = build_package(&state());
        assert_eq!(pkg.title, "Upcycled planter");
        assert_eq!(pkg.instructions.len(), 4);
        assert!(pkg.summary.contains("planter"));
    }

    /// **Scenario**: The selected option's steps become the instructions.
    #[tokio::test]
    async fn selected_option_steps_are_used() {
        let mut s = state();
        let mut option = ProductOption::new("opt-1", "Bottle planter");
        option.steps = vec!["Cut".into(), "Hang".into()];
        s.selected_option = Some(option);
        let update = Packaging.execute(&s).await.unwrap();
        let pkg = update.final_package.unwrap();
        assert_eq!(pkg.instructions, vec!["Cut".to_string(), "Hang".to_string()]);
        assert_eq!(pkg.title, "Bottle planter");
    }

    /// **Scenario**: Huge leading counts saturate the totals instead of overflowing.
    #[test]
    fn huge_quantities_saturate() {
        let mut s = state();
        s.ingredients = vec![
            Ingredient::named("100000000 glass jars", IngredientSource::Extracted, 0.9)
                .with_material("glass"),
            Ingredient::named("4294967295 tin cans", IngredientSource::User, 0.9)
                .with_material("tin"),
        ];
        let pkg = build_package(&s);
        assert_eq!(pkg.bill_of_materials[0].quantity, 100_000_000);
        assert_eq!(pkg.sustainability.items_reused, u32::MAX);
        assert_eq!(pkg.sustainability.estimated_waste_diverted_grams, u32::MAX);
    }
}
