//! Field nodes: the leaves of a form tree

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::data::{loosely_contains, scalar_text};

/// Option list of a choice field, value => label
pub type Options = IndexMap<String, String>;

/// Closed set of field kinds
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Single-line input; `input_type` is `text`, `email`, `number`...
    Text { input_type: String },
    Textarea,
    Password,
    File,
    Hidden,
    Select { options: Options, multiple: bool },
    Checkbox { checked_value: Value },
    CheckboxGroup { options: Options },
    Radio { options: Options },
}

impl FieldKind {
    pub fn label(&self) -> &str {
        match self {
            FieldKind::Text { input_type } => input_type.as_str(),
            FieldKind::Textarea => "textarea",
            FieldKind::Password => "password",
            FieldKind::File => "file",
            FieldKind::Hidden => "hidden",
            FieldKind::Select { multiple: false, .. } => "select",
            FieldKind::Select { multiple: true, .. } => "multiselect",
            FieldKind::Checkbox { .. } => "checkbox",
            FieldKind::CheckboxGroup { .. } => "checkbox-group",
            FieldKind::Radio { .. } => "radio",
        }
    }

    /// Secrets and uploads are never filled from submitted or bound data
    pub fn repopulates(&self) -> bool {
        !matches!(self, FieldKind::Password | FieldKind::File)
    }

    pub fn options(&self) -> Option<&Options> {
        match self {
            FieldKind::Select { options, .. }
            | FieldKind::CheckboxGroup { options }
            | FieldKind::Radio { options } => Some(options),
            _ => None,
        }
    }
}

/// Where a field's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Explicit,
    PriorSubmission,
    BoundData,
    Default,
    #[default]
    Unresolved,
}

impl ValueSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::PriorSubmission => "prior submission",
            Self::BoundData => "bound data",
            Self::Default => "default",
            Self::Unresolved => "unresolved",
        }
    }
}

/// A single input of a form node
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    label: Option<String>,
    attributes: IndexMap<String, String>,
    value: Option<Value>,
    has_explicit_value: bool,
    default: Option<Value>,
    key_path: Option<String>,
    source: ValueSource,
}

fn options_from<I, K, V>(options: I) -> Options
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    options
        .into_iter()
        .map(|(value, label)| (value.into(), label.into()))
        .collect()
}

impl Field {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            label: None,
            attributes: IndexMap::new(),
            value: None,
            has_explicit_value: false,
            default: None,
            key_path: None,
            source: ValueSource::Unresolved,
        }
    }

    pub fn text(name: &str) -> Self {
        Self::input(name, "text")
    }

    /// Single-line input of another HTML type (`email`, `number`, `date`...)
    pub fn input(name: &str, input_type: &str) -> Self {
        Self::new(
            name,
            FieldKind::Text {
                input_type: input_type.to_string(),
            },
        )
    }

    pub fn textarea(name: &str) -> Self {
        Self::new(name, FieldKind::Textarea)
    }

    pub fn password(name: &str) -> Self {
        Self::new(name, FieldKind::Password)
    }

    pub fn file(name: &str) -> Self {
        Self::new(name, FieldKind::File)
    }

    pub fn hidden(name: &str) -> Self {
        Self::new(name, FieldKind::Hidden)
    }

    pub fn select<I, K, V>(name: &str, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            name,
            FieldKind::Select {
                options: options_from(options),
                multiple: false,
            },
        )
    }

    pub fn multi_select<I, K, V>(name: &str, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            name,
            FieldKind::Select {
                options: options_from(options),
                multiple: true,
            },
        )
    }

    /// Checkbox submitting `"1"` when checked
    pub fn checkbox(name: &str) -> Self {
        Self::new(
            name,
            FieldKind::Checkbox {
                checked_value: Value::String("1".to_string()),
            },
        )
    }

    pub fn checkbox_group<I, K, V>(name: &str, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            name,
            FieldKind::CheckboxGroup {
                options: options_from(options),
            },
        )
    }

    pub fn radio<I, K, V>(name: &str, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            name,
            FieldKind::Radio {
                options: options_from(options),
            },
        )
    }

    /// Replace the value a checkbox submits when checked; no-op on other kinds
    pub fn checked_value(mut self, value: Value) -> Self {
        if let FieldKind::Checkbox { checked_value } = &mut self.kind {
            *checked_value = value;
        }
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set an explicit value; only a prior submission overrides it
    pub fn with_value(mut self, value: Value) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        self.has_explicit_value = true;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn label_text(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn has_explicit_value(&self) -> bool {
        self.has_explicit_value
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Full key path, known once the field has been resolved
    pub fn key_path(&self) -> Option<&str> {
        self.key_path.as_deref()
    }

    pub fn source(&self) -> ValueSource {
        self.source
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.kind, FieldKind::Hidden)
    }

    pub fn is_resolved(&self) -> bool {
        self.key_path.is_some()
    }

    /// Checkbox state: on only when the raw value equals (or contains) the checked value
    pub fn is_checked(&self) -> bool {
        match (&self.kind, &self.value) {
            (FieldKind::Checkbox { checked_value }, Some(raw)) => {
                loosely_contains(raw, checked_value)
            }
            _ => false,
        }
    }

    /// Whether `option` is selected on a select, checkbox group or radio set
    pub fn is_selected(&self, option: &str) -> bool {
        if self.kind.options().is_none() {
            return false;
        }
        let option = Value::String(option.to_string());
        self.value
            .as_ref()
            .is_some_and(|raw| loosely_contains(raw, &option))
    }

    pub(crate) fn resolve(&mut self, key_path: String, value: Option<Value>, source: ValueSource) {
        self.key_path = Some(key_path);
        self.value = value;
        self.source = source;
    }

    /// Value as shown by a preview
    pub fn display_value(&self) -> String {
        if matches!(self.kind, FieldKind::Checkbox { .. }) {
            return if self.is_checked() { "[x]" } else { "[ ]" }.to_string();
        }
        match &self.value {
            None => String::new(),
            Some(_) if matches!(self.kind, FieldKind::Password) => "••••".to_string(),
            Some(value) => scalar_text(value).unwrap_or_else(|| value.to_string()),
        }
    }
}
