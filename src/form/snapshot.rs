//! Read-only snapshot of a built form
//!
//! This is what rendering collaborators consume: the full tree as nested named
//! groups plus the hidden-fields namespace of every node.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::field::{Field, FieldKind, ValueSource};
use super::system::Method;
use super::tree::NodeRef;
use crate::data::RelationKind;

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    pub method: Method,
    /// The verb the transport sends, after spoofing
    pub form_method: Method,
    pub root: NodeSnapshot,
}

impl BuildOutput {
    pub fn hidden_fields(&self) -> &[FieldSnapshot] {
        &self.root.hidden
    }

    pub fn field(&self, name: &str) -> Option<&FieldSnapshot> {
        self.root.field(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationKind>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    pub fields: Vec<FieldSnapshot>,
    pub hidden: Vec<FieldSnapshot>,
    pub groups: IndexMap<String, Vec<NodeSnapshot>>,
}

impl NodeSnapshot {
    pub(crate) fn capture(node: NodeRef<'_>) -> Self {
        let groups = node
            .group_names()
            .into_iter()
            .map(|group| {
                let children = node
                    .formlets(Some(group))
                    .into_iter()
                    .map(NodeSnapshot::capture)
                    .collect();
                (group.to_string(), children)
            })
            .collect();

        Self {
            path: node.path().to_string(),
            relation: node.binding().map(|binding| binding.kind()),
            selected: node.is_selected(),
            fields: node.fields(None).into_iter().map(FieldSnapshot::from).collect(),
            hidden: node.hidden_fields().into_iter().map(FieldSnapshot::from).collect(),
            groups,
        }
    }

    /// Visible or hidden field by local name
    pub fn field(&self, name: &str) -> Option<&FieldSnapshot> {
        self.fields
            .iter()
            .chain(&self.hidden)
            .find(|field| field.name == name)
    }

    pub fn group(&self, name: &str) -> &[NodeSnapshot] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub key_path: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: Option<Value>,
    /// Checkbox state; `None` for other kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    pub source: ValueSource,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    /// Display text, already masked for passwords
    pub display: String,
}

impl From<&Field> for FieldSnapshot {
    fn from(field: &Field) -> Self {
        let checked = matches!(field.kind(), FieldKind::Checkbox { .. })
            .then(|| field.is_checked());
        Self {
            name: field.name().to_string(),
            key_path: field
                .key_path()
                .map_or_else(|| field.name().to_string(), str::to_string),
            kind: field.kind().label().to_string(),
            label: field.label_text().map(str::to_string),
            value: field.value().cloned(),
            checked,
            source: field.source(),
            attributes: field.attributes().clone(),
            display: field.display_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::node::formlet;
    use crate::form::tree::FormTree;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::rc::Rc;

    fn tree() -> FormTree {
        let row = formlet(|form| {
            form.add_field(Field::text("qty"))?;
            form.add_field(Field::checkbox("gift"))
        });
        let mut tree = FormTree::new(
            formlet(move |form| {
                form.add_field(Field::text("title").label("Title").attribute("maxlength", "40"))?;
                form.add_field(Field::password("secret").with_value(json!("hunter2")))?;
                form.add_field(Field::hidden("id").with_value(json!(7)))?;
                form.add_group("rows", Rc::clone(&row), 2, None)
            }),
            "o:".to_string(),
        );
        let root = tree.root_id();
        tree.node_mut(root)
            .model(json!({"title": "Order", "rows": []}))
            .unwrap();
        tree.build_node(root, &Default::default()).unwrap();
        tree
    }

    #[test]
    fn test_capture_mirrors_tree() {
        let tree = tree();
        let snapshot = NodeSnapshot::capture(tree.root());

        assert_eq!(snapshot.path, "o:");
        assert_eq!(snapshot.fields.len(), 2);
        assert_eq!(snapshot.hidden.len(), 1);
        let rows = snapshot.group("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].path, "o:rows[1]");
        assert_eq!(rows[1].fields[0].key_path, "o:rows[1][qty]");
        assert!(snapshot.group("missing").is_empty());
    }

    #[test]
    fn test_field_snapshot_details() {
        let tree = tree();
        let snapshot = NodeSnapshot::capture(tree.root());

        let title = snapshot.field("title").unwrap();
        assert_eq!(title.value, Some(json!("Order")));
        assert_eq!(title.source, ValueSource::BoundData);
        assert_eq!(title.label.as_deref(), Some("Title"));
        assert_eq!(title.attributes.get("maxlength").map(String::as_str), Some("40"));
        assert_eq!(title.checked, None);

        assert_eq!(snapshot.field("secret").unwrap().display, "••••");
        assert_eq!(snapshot.field("id").unwrap().value, Some(json!(7)));
        assert_eq!(snapshot.group("rows")[0].field("gift").unwrap().checked, Some(false));
    }

    #[test]
    fn test_serializes_nested_groups() {
        let tree = tree();
        let output = BuildOutput {
            method: Method::Put,
            form_method: Method::Put.form_method(),
            root: NodeSnapshot::capture(tree.root()),
        };
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(value["method"], json!("PUT"));
        assert_eq!(value["form_method"], json!("POST"));
        assert_eq!(value["root"]["groups"]["rows"][0]["path"], json!("o:rows[0]"));
        assert_eq!(value["root"]["fields"][0]["source"], json!("bound_data"));
        assert!(value["root"].get("relation").is_none());
        assert!(value["root"].get("selected").is_none());
    }
}
