//! PBIP project builder - Workbook → in-memory project tree

use super::formula_translator::FormulaTranslator;
use super::report::{
    to_json, LocalSettings, PageDefinition, PageEntry, ProjectManifest, ReportDefinition,
    ReportDocument, SemanticModelDefinition,
};
use super::{sanitize_name, tmdl};
use crate::error::BridgeResult;
use crate::types::Workbook;
use crate::writer::ProjectTree;
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// How lineage tags and page/report identifiers are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// Fresh random UUIDs on every run
    #[default]
    Random,
    /// Name-based UUIDs: identical input produces identical output
    Stable,
}

/// Identifier source for one project
pub struct LineageIds {
    strategy: IdStrategy,
    namespace: Uuid,
}

impl LineageIds {
    pub fn new(strategy: IdStrategy, project_name: &str) -> Self {
        Self {
            strategy,
            namespace: Uuid::new_v5(&Uuid::NAMESPACE_URL, project_name.as_bytes()),
        }
    }

    /// Next identifier; `key` names the artifact and is only used for stable ids
    pub fn next(&mut self, key: &str) -> Uuid {
        match self.strategy {
            IdStrategy::Random => Uuid::new_v4(),
            IdStrategy::Stable => Uuid::new_v5(&self.namespace, key.as_bytes()),
        }
    }
}

/// Builds the complete PBIP tree for a workbook
pub struct ProjectBuilder<'a> {
    workbook: &'a Workbook,
    project_name: String,
    id_strategy: IdStrategy,
}

impl<'a> ProjectBuilder<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        let base = workbook
            .name
            .strip_suffix(".twbx")
            .or_else(|| workbook.name.strip_suffix(".twb"))
            .unwrap_or(&workbook.name);

        Self {
            workbook,
            project_name: sanitize_name(base),
            id_strategy: IdStrategy::default(),
        }
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    fn report_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}.Report", self.project_name))
    }

    fn model_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}.SemanticModel", self.project_name))
    }

    /// Generate every project file. Paths in the tree are relative to the
    /// output directory.
    pub fn build(&self) -> BridgeResult<ProjectTree> {
        info!("Generating PBIP project '{}'", self.project_name);

        let translator = FormulaTranslator::new()?;
        let mut ids = LineageIds::new(self.id_strategy, &self.project_name);
        let mut tree = ProjectTree::new();

        tree.add_file(
            format!("{}.pbip", self.project_name),
            to_json(&ProjectManifest::new(&self.project_name))?,
        );
        tree.add_file(
            PathBuf::from(".pbi").join("localSettings.json"),
            to_json(&LocalSettings::default())?,
        );

        self.add_semantic_model(&mut tree, &translator, &mut ids)?;
        self.add_report(&mut tree, &mut ids)?;

        Ok(tree)
    }

    fn add_semantic_model(
        &self,
        tree: &mut ProjectTree,
        translator: &FormulaTranslator,
        ids: &mut LineageIds,
    ) -> BridgeResult<()> {
        let model_dir = self.model_dir();
        let definition = model_dir.join("definition");

        tree.add_file(
            model_dir.join("definition.pbism"),
            to_json(&SemanticModelDefinition::default())?,
        );
        tree.add_file(definition.join("model.tmdl"), tmdl::model_tmdl());
        let table_names = tmdl::table_names(&self.workbook.datasources);
        tree.add_file(
            definition.join("expressions.tmdl"),
            tmdl::expressions_tmdl(&table_names),
        );

        let tables = definition.join("tables");
        tree.add_dir(&tables);
        for (ds, table_name) in self.workbook.datasources.iter().zip(&table_names) {
            debug!(
                "Table '{}' ({}): {} columns, {} measures",
                table_name,
                ds.name,
                ds.columns().count(),
                ds.measures().count()
            );
            tree.add_file(
                tables.join(format!("{table_name}.tmdl")),
                tmdl::table_tmdl(ds, table_name, translator, ids),
            );
        }

        Ok(())
    }

    fn add_report(&self, tree: &mut ProjectTree, ids: &mut LineageIds) -> BridgeResult<()> {
        let report_dir = self.report_dir();
        let definition = report_dir.join("definition");
        let pages_dir = definition.join("pages");

        tree.add_file(
            report_dir.join("definition.pbir"),
            to_json(&ReportDefinition::new(&self.project_name))?,
        );
        tree.add_dir(&pages_dir);

        let mut pages = Vec::with_capacity(self.workbook.worksheets.len());
        for (index, worksheet) in self.workbook.worksheets.iter().enumerate() {
            let page_id = ids.next(&format!("page/{index}/{}", worksheet.name)).to_string();
            let page_dir = pages_dir.join(&page_id);
            debug!("Page '{}' -> {}", worksheet.name, page_id);

            tree.add_file(
                page_dir.join("page.json"),
                to_json(&PageDefinition::new(page_id.clone(), worksheet.name.clone()))?,
            );
            tree.add_dir(page_dir.join("visuals"));

            pages.push(PageEntry {
                name: page_id,
                display_name: worksheet.name.clone(),
            });
        }

        let report_id = ids.next("report").to_string();
        tree.add_file(
            definition.join("report.json"),
            to_json(&ReportDocument::new(report_id, &self.project_name, pages))?,
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataSource, DataType, Field, VisualKind, Worksheet};
    use std::path::Path;

    fn sample_workbook() -> Workbook {
        let mut ds = DataSource::new("Superstore".to_string(), "excel-direct".to_string());
        ds.add_field(Field::new("Region".to_string(), DataType::String));
        ds.add_field(
            Field::new("Profit Ratio".to_string(), DataType::Real)
                .with_formula("SUM([Profit])/SUM([Sales])".to_string()),
        );

        let mut workbook = Workbook::new("Sales: 2024.twbx".to_string());
        workbook.datasources.push(ds);
        workbook
            .worksheets
            .push(Worksheet::new("Overview".to_string(), VisualKind::Bar));
        workbook
    }

    #[test]
    fn test_project_name_sanitized() {
        let workbook = sample_workbook();
        assert_eq!(ProjectBuilder::new(&workbook).project_name(), "Sales_ 2024");
    }

    #[test]
    fn test_build_layout() {
        let workbook = sample_workbook();
        let tree = ProjectBuilder::new(&workbook).build().unwrap();

        for path in [
            "Sales_ 2024.pbip",
            ".pbi/localSettings.json",
            "Sales_ 2024.SemanticModel/definition.pbism",
            "Sales_ 2024.SemanticModel/definition/model.tmdl",
            "Sales_ 2024.SemanticModel/definition/expressions.tmdl",
            "Sales_ 2024.SemanticModel/definition/tables/Superstore.tmdl",
            "Sales_ 2024.Report/definition.pbir",
            "Sales_ 2024.Report/definition/report.json",
        ] {
            assert!(tree.file(Path::new(path)).is_some(), "missing {path}");
        }

        let pages: Vec<&Path> = tree
            .files()
            .map(|(p, _)| p)
            .filter(|p| p.ends_with("page.json"))
            .collect();
        assert_eq!(pages.len(), 1);

        let visuals = pages[0].parent().unwrap().join("visuals");
        assert!(tree.dirs().any(|d| d == visuals));
    }

    #[test]
    fn test_colliding_source_names_keep_every_table() {
        let mut workbook = Workbook::new("Book".to_string());
        for name in ["Sales/2024", "Sales_2024", "Orders"] {
            workbook
                .datasources
                .push(DataSource::new(name.to_string(), "unknown".to_string()));
        }
        let tree = ProjectBuilder::new(&workbook).build().unwrap();

        let tables: Vec<&Path> = tree
            .files()
            .map(|(p, _)| p)
            .filter(|p| p.extension().is_some_and(|e| e == "tmdl"))
            .filter(|p| p.parent().is_some_and(|d| d.ends_with("tables")))
            .collect();
        assert_eq!(tables.len(), workbook.datasources.len());

        let second = tree
            .file_text("Book.SemanticModel/definition/tables/Sales_2024_2.tmdl")
            .unwrap();
        assert!(second.starts_with("table 'Sales_2024_2'\n"));
        assert!(second.contains("\tpartition 'Sales_2024_2-partition' = m\n"));

        let expressions = tree
            .file_text("Book.SemanticModel/definition/expressions.tmdl")
            .unwrap();
        assert!(expressions.contains("\texpression 'Sales_2024' =\n"));
        assert!(expressions.contains("\texpression 'Sales_2024_2' =\n"));
    }

    #[test]
    fn test_stable_ids_are_reproducible() {
        let workbook = sample_workbook();
        let first = ProjectBuilder::new(&workbook)
            .with_id_strategy(IdStrategy::Stable)
            .build()
            .unwrap();
        let second = ProjectBuilder::new(&workbook)
            .with_id_strategy(IdStrategy::Stable)
            .build()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_ids_differ() {
        let workbook = sample_workbook();
        let first = ProjectBuilder::new(&workbook).build().unwrap();
        let second = ProjectBuilder::new(&workbook).build().unwrap();

        let report = "Sales_ 2024.Report/definition/report.json";
        assert_ne!(first.file_text(report), second.file_text(report));
        // Everything without identifiers is byte-identical
        let model = "Sales_ 2024.SemanticModel/definition/model.tmdl";
        assert_eq!(first.file_text(model), second.file_text(model));
    }

    #[test]
    fn test_stable_ids_unique_per_artifact() {
        let mut ids = LineageIds::new(IdStrategy::Stable, "P");
        let a = ids.next("table/A");
        let b = ids.next("table/B");
        assert_ne!(a, b);
        assert_eq!(a, LineageIds::new(IdStrategy::Stable, "P").next("table/A"));
    }
}
