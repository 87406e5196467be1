//! Flattening a build snapshot into list rows

use crate::data::RelationKind;
use crate::form::{FieldSnapshot, NodeSnapshot};

#[derive(Debug, Clone)]
pub enum RowKind {
    /// Header of a node: its group name and index, or the root
    Node {
        path: String,
        relation: Option<RelationKind>,
        selected: bool,
    },
    Field {
        field: FieldSnapshot,
        hidden: bool,
    },
}

/// One line of the preview list
#[derive(Debug, Clone)]
pub struct Row {
    pub depth: usize,
    pub kind: RowKind,
}

impl Row {
    /// Text shown in the list column
    pub fn title(&self) -> String {
        let indent = "  ".repeat(self.depth);
        match &self.kind {
            RowKind::Node {
                path,
                relation,
                selected,
            } => {
                let path = if path.is_empty() { "(root)" } else { path.as_str() };
                let relation = relation
                    .map(|kind| format!(" <{}>", kind.label()))
                    .unwrap_or_default();
                let marker = if *selected { " *" } else { "" };
                format!("{indent}▸ {path}{relation}{marker}")
            }
            RowKind::Field { field, hidden } => {
                let marker = if *hidden { "·" } else { " " };
                format!("{indent}{marker} {} = {}", field.name, field.display)
            }
        }
    }

    pub fn field(&self) -> Option<&FieldSnapshot> {
        match &self.kind {
            RowKind::Field { field, .. } => Some(field),
            RowKind::Node { .. } => None,
        }
    }
}

/// Depth-first rows: node header, visible fields, hidden fields, then each group
pub fn flatten(root: &NodeSnapshot) -> Vec<Row> {
    let mut rows = Vec::new();
    push_node(&mut rows, root, 0);
    rows
}

fn push_node(rows: &mut Vec<Row>, node: &NodeSnapshot, depth: usize) {
    rows.push(Row {
        depth,
        kind: RowKind::Node {
            path: node.path.clone(),
            relation: node.relation,
            selected: node.selected,
        },
    });

    let fields = node.fields.iter().map(|field| (field, false));
    let hidden = node.hidden.iter().map(|field| (field, true));
    for (field, hidden) in fields.chain(hidden) {
        rows.push(Row {
            depth: depth + 1,
            kind: RowKind::Field {
                field: field.clone(),
                hidden,
            },
        });
    }

    for children in node.groups.values() {
        for child in children {
            push_node(rows, child, depth + 1);
        }
    }
}
