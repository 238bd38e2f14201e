//! twb-bridge - Tableau workbook to Power BI Project converter
//!
//! This library extracts data sources, fields and worksheets from Tableau
//! workbooks, translates calculated fields to DAX, and generates a Power BI
//! Project (PBIP) with a TMDL semantic model and PBIR report pages.
//!
//! # Features
//!
//! - `.twb` and `.twbx` input
//! - Data sources merged by caption, first definition of a field wins
//! - Lexical Tableau → DAX formula translation
//! - Deterministic project layout, optional stable identifiers
//!
//! # Example
//!
//! ```no_run
//! use twb_bridge::parser::parse_workbook;
//! use twb_bridge::pbip::ProjectBuilder;
//! use twb_bridge::writer::write_project_tree;
//! use std::path::Path;
//!
//! let workbook = parse_workbook(Path::new("Superstore.twbx"))?;
//! let tree = ProjectBuilder::new(&workbook).build()?;
//! write_project_tree(Path::new("output"), &tree)?;
//! # Ok::<(), twb_bridge::error::BridgeError>(())
//! ```

pub mod cli;
pub mod error;
pub mod parser;
pub mod pbip;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{BridgeError, BridgeResult};
pub use types::{DataSource, DataType, Field, Visual, VisualKind, Workbook, Worksheet};
