//! Tableau workbook extraction
//!
//! Loads a `.twb` (plain XML) or `.twbx` (zip package) file and extracts the
//! normalized [`Workbook`] model: data sources with their fields, and
//! worksheets with a single visual each.

mod datasource;
mod worksheet;

pub use datasource::extract_datasources;
pub use worksheet::extract_worksheets;

use crate::error::{BridgeError, BridgeResult};
use crate::types::Workbook;
use roxmltree::Document;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Supported source formats, selected by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.twb` - workbook XML on disk
    Workbook,
    /// `.twbx` - zip package holding one `.twb`
    PackagedWorkbook,
}

impl SourceFormat {
    pub fn detect(path: &Path) -> BridgeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        if ext.eq_ignore_ascii_case("twb") {
            Ok(SourceFormat::Workbook)
        } else if ext.eq_ignore_ascii_case("twbx") {
            Ok(SourceFormat::PackagedWorkbook)
        } else {
            Err(BridgeError::UnsupportedFormat(path.display().to_string()))
        }
    }
}

/// Parse a Tableau workbook file into a [`Workbook`].
///
/// The workbook name is the file stem (`Sales.twbx` -> `Sales`).
///
/// # Example
/// ```no_run
/// use twb_bridge::parser::parse_workbook;
/// use std::path::Path;
///
/// let workbook = parse_workbook(Path::new("Sales.twbx"))?;
/// println!("Data sources: {}", workbook.datasources.len());
/// # Ok::<(), twb_bridge::error::BridgeError>(())
/// ```
pub fn parse_workbook(path: &Path) -> BridgeResult<Workbook> {
    let xml = load_source_xml(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Workbook".to_string());

    parse_workbook_xml(&xml, &name)
}

/// Read the raw workbook XML bytes, unwrapping a `.twbx` package if needed
pub fn load_source_xml(path: &Path) -> BridgeResult<Vec<u8>> {
    if !path.exists() {
        return Err(BridgeError::InputNotFound(path.to_path_buf()));
    }

    match SourceFormat::detect(path)? {
        SourceFormat::Workbook => Ok(std::fs::read(path)?),
        SourceFormat::PackagedWorkbook => read_packaged_workbook(path),
    }
}

fn read_packaged_workbook(path: &Path) -> BridgeResult<Vec<u8>> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.is_file() || !entry.name().to_ascii_lowercase().ends_with(".twb") {
            continue;
        }

        debug!("Reading workbook entry '{}' from package", entry.name());
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        return Ok(bytes);
    }

    Err(BridgeError::MissingWorkbookEntry(path.to_path_buf()))
}

/// Parse workbook XML bytes into a [`Workbook`] named `name`.
///
/// Only an undecodable or malformed document is an error; missing optional
/// attributes and elements resolve to defaults.
pub fn parse_workbook_xml(xml: &[u8], name: &str) -> BridgeResult<Workbook> {
    let text = std::str::from_utf8(xml).map_err(|e| BridgeError::Encoding(e.to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let doc = Document::parse(text)?;

    let mut workbook = Workbook::new(name.to_string());
    workbook.datasources = extract_datasources(&doc);
    workbook.worksheets = extract_worksheets(&doc);

    info!(
        "Extracted workbook '{}': {} data sources, {} worksheets",
        workbook.name,
        workbook.datasources.len(),
        workbook.worksheets.len()
    );

    Ok(workbook)
}

/// Strip bracket delimiters (`[Sales]` -> `Sales`)
pub(crate) fn strip_brackets(raw: &str) -> &str {
    raw.trim_matches(|c| c == '[' || c == ']')
}
