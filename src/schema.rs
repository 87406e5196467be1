//! Formlets declared as data
//!
//! A [`SchemaRegistry`] maps formlet names to [`FormletSchema`]s deserialized
//! from JSON. [`SchemaFormlet`] runs a schema as a prepare hook, so a whole form
//! can be described in a fixture file and built without writing code.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::FormletsConfig;
use crate::data::{BoundData, MemoryRecord, MemorySession, PriorInput, RelationQuery};
use crate::form::{
    Configurator, Field, Form, FormError, FormNode, Formlet, Method, Options, Prepare,
    QueryCustomizer, Result,
};

fn default_kind() -> String {
    "text".to_string()
}

fn default_count() -> usize {
    1
}

/// One field of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    /// `text`, `textarea`, `password`, `file`, `hidden`, `select`, `checkbox`,
    /// `checkbox_group`, `radio`; anything else is an input type such as `email`
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub checked_value: Option<Value>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Take the explicit value from this attribute of the related record
    #[serde(default)]
    pub from_related: Option<String>,
    /// Take the explicit value from the node's many-to-many selection state
    #[serde(default)]
    pub from_selection: bool,
}

impl FieldSchema {
    fn to_field(&self) -> Field {
        let name = self.name.as_str();
        let options = self.options.clone();
        let mut field = match self.kind.as_str() {
            "textarea" => Field::textarea(name),
            "password" => Field::password(name),
            "file" => Field::file(name),
            "hidden" => Field::hidden(name),
            "select" if self.multiple => Field::multi_select(name, options),
            "select" => Field::select(name, options),
            "checkbox" => Field::checkbox(name),
            "checkbox_group" => Field::checkbox_group(name, options),
            "radio" => Field::radio(name, options),
            input_type => Field::input(name, input_type),
        };

        if let Some(checked) = &self.checked_value {
            field = field.checked_value(checked.clone());
        }
        if let Some(label) = &self.label {
            field = field.label(label);
        }
        for (key, value) in &self.attributes {
            field = field.attribute(key, value);
        }
        if let Some(default) = &self.default {
            field = field.with_default(default.clone());
        }
        if let Some(value) = &self.value {
            field = field.with_value(value.clone());
        }
        field
    }
}

/// A fixed-size group of child formlets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSchema {
    pub name: String,
    pub formlet: String,
    #[serde(default = "default_count")]
    pub count: usize,
    /// Options set on every child; an option named like a field becomes its explicit value
    #[serde(default)]
    pub options: IndexMap<String, Value>,
}

/// A relation expanded into child formlets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSchema {
    pub name: String,
    pub formlet: String,
    /// Blank rows for an unsaved owner of a one-to-many relation
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub query: RelationQuery,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormletSchema {
    pub fields: Vec<FieldSchema>,
    pub groups: Vec<GroupSchema>,
    pub relations: Vec<RelationSchema>,
}

/// Named formlet schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaRegistry {
    formlets: IndexMap<String, FormletSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, schema: FormletSchema) {
        self.formlets.insert(name.to_string(), schema);
    }

    pub fn schema(&self, name: &str) -> Result<&FormletSchema> {
        self.formlets
            .get(name)
            .ok_or_else(|| FormError::UnknownFormlet(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formlets.keys().map(String::as_str)
    }

    /// A formlet running the named schema
    pub fn formlet(self: &Rc<Self>, name: &str) -> Result<Rc<dyn Formlet>> {
        self.schema(name)?;
        Ok(Rc::new(SchemaFormlet {
            registry: Rc::clone(self),
            name: name.to_string(),
            lineage: Vec::new(),
        }))
    }
}

/// Prepare hook backed by a registered schema
#[derive(Debug)]
pub struct SchemaFormlet {
    registry: Rc<SchemaRegistry>,
    name: String,
    /// Schemas enclosing this one, outermost first
    lineage: Vec<String>,
}

impl SchemaFormlet {
    /// Formlet for a group or relation of this schema; a schema may not nest itself
    fn child(&self, name: &str) -> Result<Rc<dyn Formlet>> {
        self.registry.schema(name)?;
        if self.name == name || self.lineage.iter().any(|outer| outer == name) {
            return Err(FormError::RecursiveFormlet(name.to_string()));
        }
        let mut lineage = self.lineage.clone();
        lineage.push(self.name.clone());
        Ok(Rc::new(SchemaFormlet {
            registry: Rc::clone(&self.registry),
            name: name.to_string(),
            lineage,
        }))
    }
}

impl Formlet for SchemaFormlet {
    fn prepare(&self, form: &mut Prepare<'_>) -> Result<()> {
        let schema = self.registry.schema(&self.name)?;

        for field_schema in &schema.fields {
            let mut field = field_schema.to_field();
            if field_schema.from_selection {
                field.set_value(json!(form.node().is_selected()));
            }
            if let Some(attribute) = &field_schema.from_related {
                let related = form
                    .related()
                    .and_then(|record| BoundData::Record(record).lookup(attribute));
                if let Some(value) = related {
                    field.set_value(value);
                }
            }
            if let Some(value) = form.option(&field_schema.name) {
                field.set_value(value.clone());
            }
            form.add_field(field)?;
        }

        for group in &schema.groups {
            let formlet = self.child(&group.formlet)?;
            let configurator = (!group.options.is_empty()).then(|| {
                let options = group.options.clone();
                Rc::new(move |node: &mut FormNode| -> Result<()> {
                    for (key, value) in &options {
                        node.set_option(key, value.clone());
                    }
                    Ok(())
                }) as Configurator
            });
            form.add_group(&group.name, formlet, group.count, configurator)?;
        }

        for relation in &schema.relations {
            let formlet = self.child(&relation.formlet)?;
            let customizer = (relation.query != RelationQuery::default()).then(|| {
                let configured = relation.query.clone();
                Rc::new(move |query: &mut RelationQuery| *query = configured.clone())
                    as QueryCustomizer
            });
            form.declare_relation(&relation.name, formlet, customizer, relation.count);
        }
        Ok(())
    }
}

/// Everything needed to build one form from a JSON file
#[derive(Debug, Clone, Deserialize)]
pub struct FormFixture {
    pub formlets: SchemaRegistry,
    /// Name of the root formlet
    pub root: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub spam_trap: Option<bool>,
    /// Bound record with relations
    #[serde(default)]
    pub record: Option<MemoryRecord>,
    /// Plain bound data, used when no record is given
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub prior: PriorInput,
    /// Session token; a random one is issued when absent
    #[serde(default)]
    pub token: Option<String>,
}

impl FormFixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("invalid fixture {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Assemble the form; it still has to be built
    pub fn into_form(self, config: FormletsConfig) -> Result<Form> {
        let registry = Rc::new(self.formlets);
        let session = match &self.token {
            Some(token) => MemorySession::with_token(token),
            None => MemorySession::new(),
        };

        let mut form = Form::from_rc(registry.formlet(&self.root)?)
            .config(config)
            .method(self.method)
            .prior_input(self.prior)
            .session(Rc::new(session));
        if let Some(prefix) = &self.prefix {
            form = form.prefix(prefix);
        }
        if let Some(enabled) = self.spam_trap {
            form = form.spam_trap(enabled);
        }

        match (self.record, self.data) {
            (Some(record), _) => form.model(BoundData::record(record))?,
            (None, Some(data)) => form.model(data)?,
            (None, None) => {}
        }
        Ok(form)
    }
}
