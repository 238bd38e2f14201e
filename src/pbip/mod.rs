//! Power BI Project (PBIP) generation
//!
//! Turns an extracted [`Workbook`](crate::types::Workbook) into a PBIP tree:
//! - Semantic model: TMDL tables with columns, DAX measures and partitions
//! - Report: PBIR manifest with one placeholder page per worksheet
//! - Formula translation: Tableau calculations → DAX

mod builder;
mod formula_translator;
pub mod report;
pub mod tmdl;

pub use builder::{IdStrategy, LineageIds, ProjectBuilder};
pub use formula_translator::FormulaTranslator;

/// Make a name safe for file names and PBIP object names.
///
/// Enclosing brackets are trimmed and `/`, `\`, `:` and `?` become `_`.
pub fn sanitize_name(name: &str) -> String {
    name.trim_matches(|c| c == '[' || c == ']')
        .replace(['/', '\\', ':', '?'], "_")
}
