use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::Utc;

use crate::workflow::executor::{ExecutorFault, NodeExecutor};
use crate::workflow::outputs::{ExportBundle, ProductPackage};
use crate::workflow::state::WorkflowState;
use crate::workflow::update::StateUpdate;

use super::{build_package, slugify, EXPORT};

fn markdown(pkg: &ProductPackage) -> String {
    let mut md = format!("# {}\n\n{}\n\n## Bill of materials\n\n", pkg.title, pkg.summary);
    for item in &pkg.bill_of_materials {
        let _ = writeln!(
            md,
            "- {} x {} ({}){}",
            item.quantity,
            item.item,
            item.material,
            if item.reused { ", reused" } else { "" }
        );
    }
    md.push_str("\n## Instructions\n\n");
    for (i, step) in pkg.instructions.iter().enumerate() {
        let _ = writeln!(md, "{}. {}", i + 1, step);
    }
    let _ = write!(
        md,
        "\n## Sustainability\n\n{} items reused, about {} g kept out of the waste stream.\n",
        pkg.sustainability.items_reused, pkg.sustainability.estimated_waste_diverted_grams
    );
    md
}

/// `export`: serializes the package into a downloadable bundle.
pub struct Export;

#[async_trait]
impl NodeExecutor for Export {
    fn id(&self) -> &'static str {
        EXPORT
    }

    async fn execute(&self, state: &WorkflowState) -> Result<StateUpdate, ExecutorFault> {
        let package = match &state.final_package {
            Some(p) => p.clone(),
            None => build_package(state),
        };
        let short_id: String = state.thread_id.chars().take(8).collect();
        let bundle = ExportBundle {
            filename: format!("{}-{}.json", slugify(&package.title), short_id),
            format: "json".to_string(),
            document: serde_json::to_string_pretty(&package)?,
            markdown: markdown(&package),
            created_at: Utc::now(),
        };
        tracing::debug!(filename = %bundle.filename, "export bundle ready");
        Ok(StateUpdate {
            export: Some(bundle),
            ..StateUpdate::new()
        })
    }
}
