use crate::error::BridgeResult;
use crate::parser;
use crate::pbip::{IdStrategy, ProjectBuilder};
use crate::types::Workbook;
use crate::writer::{write_project_tree, ProjectTree};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Settings for one conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Output directory; the project files land directly inside it
    pub output: PathBuf,
    pub id_strategy: IdStrategy,
    /// Print the extracted model and the generated files
    pub verbose: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from("output"),
            id_strategy: IdStrategy::Random,
            verbose: false,
        }
    }
}

/// Execute the convert command: Tableau workbook → PBIP project
pub fn convert(input: &Path, options: &ConvertOptions) -> BridgeResult<ProjectTree> {
    println!("{}", "🔁 twb-bridge - Tableau → Power BI Project".bold().green());
    println!("   Input:  {}", input.display());
    println!("   Output: {}\n", options.output.display());

    if options.verbose {
        println!("{}", "📖 Parsing Tableau workbook...".cyan());
    }

    let workbook = parser::parse_workbook(input)?;

    println!(
        "   Found {} data sources and {} worksheets\n",
        workbook.datasources.len(),
        workbook.worksheets.len()
    );

    if options.verbose {
        print_workbook_summary(&workbook);
        println!("{}", "🏗️  Generating PBIP project...".cyan());
    }

    let builder = ProjectBuilder::new(&workbook).with_id_strategy(options.id_strategy);
    let tree = builder.build()?;
    write_project_tree(&options.output, &tree)?;

    if options.verbose {
        for (path, contents) in tree.files() {
            println!("   {} ({} bytes)", path.display(), contents.len());
        }
        println!();
    }

    let project_file = options.output.join(format!("{}.pbip", builder.project_name()));
    println!("{}", "✅ Conversion Complete!".bold().green());
    println!("   Project: {}", project_file.display());
    println!("   You can now open the .pbip file in Power BI Desktop.\n");

    Ok(tree)
}

fn print_workbook_summary(workbook: &Workbook) {
    for ds in &workbook.datasources {
        println!(
            "   📊 Data source: {} ({})",
            ds.name.bright_blue(),
            ds.connection_type
        );
        println!(
            "      {} columns, {} calculated fields",
            ds.columns().count(),
            ds.measures().count()
        );
        for field in ds.measures() {
            println!("      ƒ {} = {}", field.display_name(), field.name);
        }
    }
    for ws in &workbook.worksheets {
        println!(
            "   📄 Worksheet: {} [{}]",
            ws.name.bright_blue(),
            ws.visual.kind.as_str()
        );
    }
    println!();
}
