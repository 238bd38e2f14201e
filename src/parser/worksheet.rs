use crate::types::{VisualKind, Worksheet};
use roxmltree::Document;
use tracing::debug;

/// Extract every worksheet with one visual typed by its first mark.
pub fn extract_worksheets(doc: &Document) -> Vec<Worksheet> {
    doc.descendants()
        .filter(|n| n.has_tag_name("worksheet"))
        .map(|node| {
            let name = node.attribute("name").unwrap_or("unnamed");
            let kind = node
                .descendants()
                .find(|n| n.has_tag_name("mark"))
                .and_then(|mark| mark.attribute("class"))
                .map(VisualKind::from_mark_class)
                .unwrap_or_default();

            debug!("Worksheet '{}' -> {} visual", name, kind.as_str());
            Worksheet::new(name.to_string(), kind)
        })
        .collect()
}
