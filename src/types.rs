//==============================================================================
// Field Classifiers
//==============================================================================

/// Declared data type of a workbook field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    String,
    Integer,
    Real,
    Date,
    DateTime,
    Boolean,
}

impl DataType {
    /// Parse a Tableau `datatype` attribute. Unknown values fall back to `String`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "integer" => DataType::Integer,
            "real" => DataType::Real,
            "date" => DataType::Date,
            "datetime" => DataType::DateTime,
            "boolean" => DataType::Boolean,
            _ => DataType::String,
        }
    }

    /// Classify free-form physical type text (metadata records) by substring.
    ///
    /// Order matters: "datetime" must be checked before "date".
    pub fn from_physical_type(value: &str) -> Self {
        let lower = value.to_lowercase();
        if lower.contains("integer") {
            DataType::Integer
        } else if lower.contains("real") || lower.contains("float") {
            DataType::Real
        } else if lower.contains("datetime") {
            DataType::DateTime
        } else if lower.contains("date") {
            DataType::Date
        } else if lower.contains("boolean") {
            DataType::Boolean
        } else {
            DataType::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Date => "date",
            DataType::DateTime => "datetime",
            DataType::Boolean => "boolean",
        }
    }
}

/// Analytical role of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldRole {
    #[default]
    Dimension,
    Measure,
}

impl FieldRole {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("measure") {
            FieldRole::Measure
        } else {
            FieldRole::Dimension
        }
    }
}

/// How a field is displayed (Tableau `type` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayType {
    #[default]
    Nominal,
    Ordinal,
    Quantitative,
}

impl DisplayType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ordinal" => DisplayType::Ordinal,
            "quantitative" => DisplayType::Quantitative,
            _ => DisplayType::Nominal,
        }
    }
}

//==============================================================================
// Data Sources
//==============================================================================

/// A field of a data source: either a physical column or a calculation
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub caption: Option<String>,
    pub datatype: DataType,
    pub role: FieldRole,
    pub display_type: DisplayType,
    /// Source-language formula; present only for calculated fields
    pub formula: Option<String>,
    pub alias: Option<String>,
}

impl Field {
    /// Physical column with default role and display type
    pub fn new(name: String, datatype: DataType) -> Self {
        Self {
            name,
            caption: None,
            datatype,
            role: FieldRole::default(),
            display_type: DisplayType::default(),
            formula: None,
            alias: None,
        }
    }

    pub fn with_formula(mut self, formula: String) -> Self {
        self.formula = Some(formula);
        self
    }

    /// Caption when the workbook defines one, else the field name
    pub fn display_name(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.name)
    }

    /// True when the field carries a formula and becomes a measure
    pub fn is_calculated(&self) -> bool {
        self.formula.is_some()
    }
}

/// A named, schema-bearing dataset. Field names are unique; the first
/// definition of a name is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub name: String,
    pub connection_type: String,
    pub fields: Vec<Field>,
}

impl DataSource {
    pub fn new(name: String, connection_type: String) -> Self {
        Self {
            name,
            connection_type,
            fields: Vec::new(),
        }
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Add a field unless one with the same name exists. Returns whether it was added.
    pub fn add_field(&mut self, field: Field) -> bool {
        if self.contains_field(&field.name) {
            return false;
        }
        self.fields.push(field);
        true
    }

    pub fn columns(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.is_calculated())
    }

    pub fn measures(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_calculated())
    }
}

//==============================================================================
// Worksheets
//==============================================================================

/// Visual classifier inferred from a worksheet's first mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualKind {
    #[default]
    Table,
    Bar,
    Line,
    Area,
    Pie,
    Map,
    Scatter,
    Text,
}

impl VisualKind {
    /// Map a Tableau mark class (`Bar`, `Line`, `Circle`, ...) to a visual kind.
    /// `Automatic` and unknown classes become `Table`.
    pub fn from_mark_class(class: &str) -> Self {
        match class.trim().to_ascii_lowercase().as_str() {
            "bar" => VisualKind::Bar,
            "line" => VisualKind::Line,
            "area" => VisualKind::Area,
            "pie" => VisualKind::Pie,
            "map" | "multipolygon" => VisualKind::Map,
            "circle" | "shape" => VisualKind::Scatter,
            "text" => VisualKind::Text,
            _ => VisualKind::Table,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualKind::Table => "table",
            VisualKind::Bar => "bar",
            VisualKind::Line => "line",
            VisualKind::Area => "area",
            VisualKind::Pie => "pie",
            VisualKind::Map => "map",
            VisualKind::Scatter => "scatter",
            VisualKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub name: String,
    pub kind: VisualKind,
    pub fields: Vec<String>,
    pub filters: Vec<String>,
}

impl Visual {
    pub fn new(name: String, kind: VisualKind) -> Self {
        Self {
            name,
            kind,
            fields: Vec::new(),
            filters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Worksheet {
    pub name: String,
    pub visual: Visual,
}

impl Worksheet {
    /// Worksheet owning a single visual of the same name
    pub fn new(name: String, kind: VisualKind) -> Self {
        let visual = Visual::new(name.clone(), kind);
        Self { name, visual }
    }
}

//==============================================================================
// Workbook
//==============================================================================

/// Root aggregate produced by extraction and consumed read-only by the builder
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub name: String,
    pub datasources: Vec<DataSource>,
    pub worksheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new(name: String) -> Self {
        Self {
            name,
            datasources: Vec::new(),
            worksheets: Vec::new(),
        }
    }

    pub fn datasource(&self, name: &str) -> Option<&DataSource> {
        self.datasources.iter().find(|ds| ds.name == name)
    }
}
