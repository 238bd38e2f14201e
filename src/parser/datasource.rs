//! Data-source extraction with caption merging and first-write-wins fields

use super::strip_brackets;
use crate::types::{DataSource, DataType, DisplayType, Field, FieldRole};
use roxmltree::{Document, Node};
use tracing::debug;

const PARAMETERS: &str = "Parameters";

/// Extract every non-parameter data source in document order.
///
/// Elements that resolve to the same display name are merged into one
/// [`DataSource`]. Column definitions of every merged element are read
/// before any metadata record, so a calculated field is never shadowed by a
/// physical column of the same name.
pub fn extract_datasources(doc: &Document) -> Vec<DataSource> {
    let mut groups: Vec<(DataSource, Vec<Node>)> = Vec::new();

    for node in doc.descendants().filter(|n| n.has_tag_name("datasource")) {
        let internal_name = node.attribute("name").unwrap_or("unnamed");
        let caption = node.attribute("caption");

        if is_parameters(internal_name, caption) {
            debug!("Skipping parameters data source '{}'", internal_name);
            continue;
        }

        let display_name = caption.unwrap_or(internal_name);
        match groups.iter_mut().find(|(ds, _)| ds.name == display_name) {
            Some((_, nodes)) => nodes.push(node),
            None => groups.push((
                DataSource::new(display_name.to_string(), connection_class(node)),
                vec![node],
            )),
        }
    }

    groups
        .into_iter()
        .map(|(mut datasource, nodes)| {
            for column in nodes
                .iter()
                .flat_map(|node| node.descendants())
                .filter(|n| n.has_tag_name("column"))
            {
                if let Some(field) = column_field(column) {
                    add_or_skip(&mut datasource, field);
                }
            }

            for record in nodes
                .iter()
                .flat_map(|node| node.descendants())
                .filter(|n| n.has_tag_name("metadata-record"))
            {
                if let Some(field) = metadata_field(record) {
                    add_or_skip(&mut datasource, field);
                }
            }

            datasource
        })
        .collect()
}

fn is_parameters(internal_name: &str, caption: Option<&str>) -> bool {
    let name_match = internal_name
        .get(..PARAMETERS.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PARAMETERS));
    let caption_match = caption.is_some_and(|c| c.trim().eq_ignore_ascii_case(PARAMETERS));
    name_match || caption_match
}

fn connection_class(node: Node) -> String {
    child(node, "connection")
        .and_then(|conn| conn.attribute("class"))
        .unwrap_or("unknown")
        .to_string()
}

fn add_or_skip(datasource: &mut DataSource, field: Field) {
    let name = field.name.clone();
    if datasource.add_field(field) {
        debug!("{}: field '{}'", datasource.name, name);
    } else {
        debug!("{}: keeping first definition of '{}'", datasource.name, name);
    }
}

/// `<column name='[Profit Ratio]' datatype='real' role='measure'>` with an
/// optional `<calculation formula='...'/>` child
fn column_field(column: Node) -> Option<Field> {
    let name = strip_brackets(column.attribute("name").unwrap_or_default());
    if name.is_empty() {
        return None;
    }

    Some(Field {
        name: name.to_string(),
        caption: column.attribute("caption").map(str::to_string),
        datatype: column
            .attribute("datatype")
            .map(DataType::parse)
            .unwrap_or_default(),
        role: column.attribute("role").map(FieldRole::parse).unwrap_or_default(),
        display_type: column
            .attribute("type")
            .map(DisplayType::parse)
            .unwrap_or_default(),
        formula: child(column, "calculation")
            .and_then(|calc| calc.attribute("formula"))
            .filter(|formula| !formula.trim().is_empty())
            .map(str::to_string),
        alias: column.attribute("alias").map(str::to_string),
    })
}

/// `<metadata-record class='column'>` describing a physical column
fn metadata_field(record: Node) -> Option<Field> {
    let name = child_text(record, "local-name").map(strip_brackets)?;
    if name.is_empty() {
        return None;
    }

    let datatype = child_text(record, "parent-type")
        .or_else(|| child_text(record, "local-type"))
        .map(DataType::from_physical_type)
        .unwrap_or_default();

    Some(Field::new(name.to_string(), datatype))
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child(node, tag).and_then(|n| n.text()).map(str::trim)
}
