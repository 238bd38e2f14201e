//! PBIP manifest and PBIR report documents (JSON)

use crate::error::BridgeResult;
use serde::Serialize;

pub const PAGE_SCHEMA: &str =
    "https://developer.microsoft.com/json-schemas/fabric/item/report/definition/page/1.0.0/schema.json";
pub const REPORT_SCHEMA: &str =
    "https://developer.microsoft.com/json-schemas/fabric/item/report/definition/report/1.0.0/schema.json";

pub const PAGE_WIDTH: u32 = 1280;
pub const PAGE_HEIGHT: u32 = 720;

const FORMAT_VERSION: &str = "1.0";

/// Pretty-printed JSON with two-space indentation
pub fn to_json<T: Serialize>(value: &T) -> BridgeResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

//==============================================================================
// Project level
//==============================================================================

/// `<project>.pbip`
#[derive(Debug, Serialize)]
pub struct ProjectManifest {
    pub version: &'static str,
    pub artifacts: Vec<Artifact>,
    pub settings: ProjectSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Artifact {
    Report { path: String },
    SemanticModel { path: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub enable_auto_recovery: bool,
}

impl ProjectManifest {
    pub fn new(project_name: &str) -> Self {
        Self {
            version: FORMAT_VERSION,
            artifacts: vec![
                Artifact::Report {
                    path: format!("{project_name}.Report"),
                },
                Artifact::SemanticModel {
                    path: format!("{project_name}.SemanticModel"),
                },
            ],
            settings: ProjectSettings {
                enable_auto_recovery: true,
            },
        }
    }
}

/// `.pbi/localSettings.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSettings {
    pub version: &'static str,
    pub is_auto_recovery_enabled: bool,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            is_auto_recovery_enabled: true,
        }
    }
}

/// `<project>.SemanticModel/definition.pbism`
#[derive(Debug, Serialize)]
pub struct SemanticModelDefinition {
    pub version: &'static str,
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl Default for SemanticModelDefinition {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            settings: serde_json::Map::new(),
        }
    }
}

//==============================================================================
// Report
//==============================================================================

/// `<project>.Report/definition.pbir`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub version: &'static str,
    pub dataset_reference: DatasetReference,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReference {
    pub by_path: ByPath,
}

#[derive(Debug, Serialize)]
pub struct ByPath {
    pub path: String,
}

impl ReportDefinition {
    pub fn new(project_name: &str) -> Self {
        Self {
            version: FORMAT_VERSION,
            dataset_reference: DatasetReference {
                by_path: ByPath {
                    path: format!("../{project_name}.SemanticModel"),
                },
            },
        }
    }
}

/// `definition/pages/<id>/page.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDefinition {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub name: String,
    pub display_name: String,
    pub display_option: &'static str,
    pub width: u32,
    pub height: u32,
    pub config: PageConfig,
}

#[derive(Debug, Default, Serialize)]
pub struct PageConfig {
    pub layouts: Vec<serde_json::Value>,
}

impl PageDefinition {
    pub fn new(id: String, display_name: String) -> Self {
        Self {
            schema: PAGE_SCHEMA,
            name: id,
            display_name,
            display_option: "FitToPage",
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            config: PageConfig::default(),
        }
    }
}

/// Page registration in `report.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub name: String,
    pub display_name: String,
}

/// `definition/report.json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub id: String,
    pub name: String,
    pub theme_collection: ThemeCollection,
    pub layout_optimization: &'static str,
    pub pages: Vec<PageEntry>,
    pub config: ReportConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeCollection {
    pub base_theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub version: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReportConfig {
    pub version: &'static str,
    pub settings: ReportSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    pub is_persistent_user_state_disabled: bool,
    pub hide_visual_container_header: bool,
    pub use_default_aggregate_display_name: bool,
}

impl ReportDocument {
    pub fn new(id: String, project_name: &str, pages: Vec<PageEntry>) -> Self {
        Self {
            schema: REPORT_SCHEMA,
            id,
            name: project_name.to_string(),
            theme_collection: ThemeCollection {
                base_theme: Theme {
                    name: "CY24SU02",
                    version: "5.0.0",
                    kind: "default",
                },
            },
            layout_optimization: "horizontal",
            pages,
            config: ReportConfig {
                version: "5.59",
                settings: ReportSettings {
                    is_persistent_user_state_disabled: false,
                    hide_visual_container_header: false,
                    use_default_aggregate_display_name: true,
                },
            },
        }
    }
}
