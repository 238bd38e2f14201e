//! TMDL (tabular model definition language) rendering for the semantic model

use super::builder::LineageIds;
use super::formula_translator::FormulaTranslator;
use super::sanitize_name;
use crate::types::{DataSource, DataType, Field};
use std::collections::HashSet;

/// Map a workbook data type to a TMDL `dataType`
pub fn tmdl_datatype(datatype: DataType) -> &'static str {
    match datatype {
        DataType::String => "string",
        DataType::Integer => "int64",
        DataType::Real => "double",
        DataType::Date | DataType::DateTime => "dateTime",
        DataType::Boolean => "boolean",
    }
}

/// Quote a TMDL object name: `Profit's` → `'Profit''s'`
pub fn quote(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// `definition/model.tmdl`
pub fn model_tmdl() -> String {
    [
        "model Model",
        "\tcompatibilityLevel: 1550",
        "\tculture: en-US",
        "\tdefaultPowerBIDataSourceVersion: powerBI_V3",
        "\tsourceQueryCulture: en-US",
        "\tdisplayOptions: [",
        "\t\tcategory: base",
        "\t]",
        "",
    ]
    .join("\n")
}

/// Sanitized table name per data source, in order.
///
/// Names that collide after sanitizing (compared case-insensitively, as
/// TMDL and most file systems do) get a `_2`, `_3`, ... suffix.
pub fn table_names(datasources: &[DataSource]) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut names = Vec::with_capacity(datasources.len());

    for ds in datasources {
        let base = sanitize_name(&ds.name);
        let mut name = base.clone();
        let mut suffix = 2;
        while !taken.insert(name.to_lowercase()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        names.push(name);
    }

    names
}

/// `definition/expressions.tmdl`: one empty `#table` query per table name
pub fn expressions_tmdl(table_names: &[String]) -> String {
    let mut lines = vec!["expression Expressions".to_string(), String::new()];

    for table_name in table_names {
        lines.push(format!("\texpression {} =", quote(table_name)));
        lines.extend(
            [
                "\t\t```",
                "\t\tlet",
                "\t\t\tSource = #table(",
                "\t\t\t\ttype table [Column1 = text],",
                "\t\t\t\t{}",
                "\t\t\t)",
                "\t\tin",
                "\t\t\tSource",
                "\t\t```",
                "",
            ]
            .map(str::to_string),
        );
    }

    lines.join("\n")
}

/// `definition/tables/<name>.tmdl`: columns, translated measures and an
/// import partition reading the data source's stub expression.
///
/// Objects are named by workbook field name, which is unique per data source
/// and is what other formulas reference.
pub fn table_tmdl(
    ds: &DataSource,
    table_name: &str,
    translator: &FormulaTranslator,
    ids: &mut LineageIds,
) -> String {
    let mut lines = vec![
        format!("table {}", quote(table_name)),
        format!("\tlineageTag: {}", ids.next(&format!("table/{table_name}"))),
        String::new(),
    ];

    for field in ds.columns() {
        lines.extend(column_lines(table_name, field, ids));
    }

    for field in ds.measures() {
        let dax = translator.translate(field.formula.as_deref().unwrap_or_default());
        lines.extend(measure_lines(table_name, field, &dax, ids));
    }

    lines.extend([
        format!("\tpartition {} = m", quote(&format!("{table_name}-partition"))),
        "\t\tmode: import".to_string(),
        "\t\tsource =".to_string(),
        "\t\t\t```".to_string(),
        format!("\t\t\t{table_name}"),
        "\t\t\t```".to_string(),
        String::new(),
    ]);

    lines.join("\n")
}

fn column_lines(table_name: &str, field: &Field, ids: &mut LineageIds) -> Vec<String> {
    vec![
        format!("\tcolumn {}", quote(&field.name)),
        format!("\t\tdataType: {}", tmdl_datatype(field.datatype)),
        format!(
            "\t\tlineageTag: {}",
            ids.next(&format!("table/{table_name}/column/{}", field.name))
        ),
        "\t\tsummarizeBy: none".to_string(),
        format!("\t\tsourceLineageTag: {}", field.name),
        String::new(),
    ]
}

fn measure_lines(
    table_name: &str,
    field: &Field,
    dax: &str,
    ids: &mut LineageIds,
) -> Vec<String> {
    let mut lines = Vec::new();

    if dax.contains('\n') {
        lines.push(format!("\tmeasure {} =", quote(&field.name)));
        lines.push("\t\t\t```".to_string());
        lines.extend(dax.lines().map(|line| format!("\t\t\t{}", line.trim_end())));
        lines.push("\t\t\t```".to_string());
    } else {
        lines.push(format!("\tmeasure {} = {}", quote(&field.name), dax));
    }

    lines.push(format!(
        "\t\tlineageTag: {}",
        ids.next(&format!("table/{table_name}/measure/{}", field.name))
    ));
    lines.push(String::new());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbip::IdStrategy;
    use pretty_assertions::assert_eq;

    fn sample_source() -> DataSource {
        let mut ds = DataSource::new("Orders".to_string(), "excel-direct".to_string());
        ds.add_field(Field::new("Region".to_string(), DataType::String));
        ds.add_field(Field::new("Order Date".to_string(), DataType::DateTime));
        ds.add_field(
            Field::new("Ratio".to_string(), DataType::Real)
                .with_formula("SUM([Profit])/AVG([Sales])".to_string()),
        );
        ds
    }

    #[test]
    fn test_datatype_mapping() {
        assert_eq!(tmdl_datatype(DataType::String), "string");
        assert_eq!(tmdl_datatype(DataType::Integer), "int64");
        assert_eq!(tmdl_datatype(DataType::Real), "double");
        assert_eq!(tmdl_datatype(DataType::Date), "dateTime");
        assert_eq!(tmdl_datatype(DataType::DateTime), "dateTime");
        assert_eq!(tmdl_datatype(DataType::Boolean), "boolean");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("Sales"), "'Sales'");
        assert_eq!(quote("Owner's Region"), "'Owner''s Region'");
    }

    #[test]
    fn test_table_tmdl() {
        let translator = FormulaTranslator::new().unwrap();
        let mut ids = LineageIds::new(IdStrategy::Stable, "Test");
        let tmdl = table_tmdl(&sample_source(), "Orders", &translator, &mut ids);

        assert!(tmdl.starts_with("table 'Orders'\n\tlineageTag: "));
        assert!(tmdl.contains("\tcolumn 'Region'\n\t\tdataType: string\n"));
        assert!(tmdl.contains("\tcolumn 'Order Date'\n\t\tdataType: dateTime\n"));
        assert!(tmdl.contains("\t\tsourceLineageTag: Region\n"));
        assert!(tmdl.contains("\tmeasure 'Ratio' = SUM([Profit])/AVERAGE([Sales])\n"));
        assert!(!tmdl.contains("column 'Ratio'"));
        assert!(tmdl.contains("\tpartition 'Orders-partition' = m\n\t\tmode: import\n"));
        assert!(tmdl.contains("\t\t\t```\n\t\t\tOrders\n\t\t\t```\n"));
    }

    #[test]
    fn test_objects_named_by_field_name() {
        let translator = FormulaTranslator::new().unwrap();
        let mut ids = LineageIds::new(IdStrategy::Random, "Test");
        let mut ds = DataSource::new("Orders".to_string(), "unknown".to_string());
        ds.add_field(Field::new("Sales".to_string(), DataType::Real));
        let mut total = Field::new("Calculation_1".to_string(), DataType::Real)
            .with_formula("SUM([Sales])".to_string());
        total.caption = Some("Sales".to_string());
        ds.add_field(total);

        let tmdl = table_tmdl(&ds, "Orders", &translator, &mut ids);
        assert!(tmdl.contains("\tcolumn 'Sales'\n"));
        assert!(tmdl.contains("\tmeasure 'Calculation_1' = SUM([Sales])\n"));
        assert!(!tmdl.contains("measure 'Sales'"));
    }

    #[test]
    fn test_measure_references_resolve() {
        let translator = FormulaTranslator::new().unwrap();
        let mut ids = LineageIds::new(IdStrategy::Stable, "Test");
        let mut ds = DataSource::new("Orders".to_string(), "unknown".to_string());
        let mut base = Field::new("Calculation_1".to_string(), DataType::Real)
            .with_formula("COUNTD([Customer])".to_string());
        base.caption = Some("Customers".to_string());
        let mut double = Field::new("Calculation_2".to_string(), DataType::Real)
            .with_formula("[Calculation_1] * 2".to_string());
        double.caption = Some("Double".to_string());
        ds.add_field(base);
        ds.add_field(double);

        let tmdl = table_tmdl(&ds, "Orders", &translator, &mut ids);
        assert!(tmdl.contains("\tmeasure 'Calculation_1' = DISTINCTCOUNT([Customer])\n"));
        assert!(tmdl.contains("\tmeasure 'Calculation_2' = [Calculation_1] * 2\n"));
        assert!(!tmdl.contains("'Customers'"));
        assert!(!tmdl.contains("'Double'"));
    }

    #[test]
    fn test_table_names_disambiguated() {
        let sources = vec![
            DataSource::new("Sales/2024".to_string(), "unknown".to_string()),
            DataSource::new("Sales_2024".to_string(), "unknown".to_string()),
            DataSource::new("sales:2024".to_string(), "unknown".to_string()),
            DataSource::new("Orders".to_string(), "unknown".to_string()),
        ];

        assert_eq!(
            table_names(&sources),
            vec!["Sales_2024", "Sales_2024_2", "sales_2024_3", "Orders"]
        );
    }

    #[test]
    fn test_multiline_measure() {
        let translator = FormulaTranslator::new().unwrap();
        let mut ids = LineageIds::new(IdStrategy::Stable, "Test");
        let mut ds = DataSource::new("Orders".to_string(), "unknown".to_string());
        ds.add_field(
            Field::new("Flag".to_string(), DataType::Integer)
                .with_formula("IF [Sales] > 0\nTHEN 1\nELSE 0\nEND".to_string()),
        );

        let tmdl = table_tmdl(&ds, "Orders", &translator, &mut ids);
        assert!(tmdl.contains(
            "\tmeasure 'Flag' =\n\t\t\t```\n\t\t\tIF([Sales] > 0\n\t\t\t, 1\n\t\t\t, 0)\n\t\t\t```\n"
        ));
    }

    #[test]
    fn test_expressions_tmdl() {
        let sources = vec![
            sample_source(),
            DataSource::new("Web: Hits".to_string(), "unknown".to_string()),
            DataSource::new("Web? Hits".to_string(), "unknown".to_string()),
        ];
        let text = expressions_tmdl(&table_names(&sources));

        assert!(text.starts_with("expression Expressions\n\n"));
        assert!(text.contains("\texpression 'Orders' =\n\t\t```\n\t\tlet\n"));
        assert!(text.contains("\texpression 'Web_ Hits' =\n"));
        assert!(text.contains("\texpression 'Web_ Hits_2' =\n"));
        assert_eq!(text.matches("type table [Column1 = text],").count(), 3);
    }

    #[test]
    fn test_model_tmdl() {
        let model = model_tmdl();
        assert!(model.starts_with("model Model\n\tcompatibilityLevel: 1550\n"));
        assert!(model.ends_with("\t]\n"));
    }
}
