//! Value resolution policy
//!
//! Sources are consulted in a fixed order and the first one holding a value wins:
//!
//! 1. prior submission, looked up by the field's full key path
//! 2. explicit value set on the field
//! 3. bound data, traversed with the field's local name
//! 4. static default
//!
//! A prior submission overrides even an explicit value, so the user's last
//! attempt is what they see again. Falsy values (`false`, `0`, `""`, `[]`) are
//! values; only absence falls through.

use serde_json::Value;

use super::field::{Field, ValueSource};
use crate::data::{BoundData, PriorInput};

/// Outcome of resolving one field
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Option<Value>,
    pub source: ValueSource,
}

impl Resolution {
    fn found(source: ValueSource, value: Value) -> Self {
        Self {
            value: Some(value),
            source,
        }
    }
}

pub fn resolve(
    field: &Field,
    key_path: &str,
    prior: &PriorInput,
    bound: Option<&BoundData>,
) -> Resolution {
    let repopulates = field.kind().repopulates();

    if repopulates {
        if let Some(value) = prior.get(key_path) {
            return Resolution::found(ValueSource::PriorSubmission, value.clone());
        }
    }

    if field.has_explicit_value() {
        if let Some(value) = field.value() {
            return Resolution::found(ValueSource::Explicit, value.clone());
        }
    }

    if repopulates {
        if let Some(value) = bound.and_then(|data| data.lookup(field.name())) {
            return Resolution::found(ValueSource::BoundData, value);
        }
    }

    match field.default_value() {
        Some(value) => Resolution::found(ValueSource::Default, value.clone()),
        None => Resolution {
            value: None,
            source: ValueSource::Unresolved,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bound(value: Value) -> BoundData {
        BoundData::from(value)
    }

    mod precedence {
        use super::*;

        #[test]
        fn test_prior_submission_beats_everything() {
            let field = Field::text("foo")
                .with_value(json!("explicit"))
                .with_default(json!("default"));
            let prior = PriorInput::new(json!({"foo": "old"}));
            let data = bound(json!({"foo": "model"}));

            let resolution = resolve(&field, "foo", &prior, Some(&data));
            assert_eq!(resolution.value, Some(json!("old")));
            assert_eq!(resolution.source, ValueSource::PriorSubmission);
        }

        #[test]
        fn test_falsy_prior_values_still_override() {
            for stored in [json!(false), json!(0), json!(""), json!([])] {
                let field = Field::text("foo").with_value(json!("explicit"));
                let prior = PriorInput::new(json!({ "foo": stored.clone() }));
                let resolution = resolve(&field, "foo", &prior, None);
                assert_eq!(resolution.value, Some(stored));
                assert_eq!(resolution.source, ValueSource::PriorSubmission);
            }
        }

        #[test]
        fn test_explicit_beats_bound_data() {
            let field = Field::text("foo").with_value(json!("bar"));
            let data = bound(json!({"foo": "foo"}));

            let resolution = resolve(&field, "foo", &PriorInput::default(), Some(&data));
            assert_eq!(resolution.value, Some(json!("bar")));
            assert_eq!(resolution.source, ValueSource::Explicit);
        }

        #[test]
        fn test_bound_false_is_kept() {
            let field = Field::text("foo").with_default(json!("default"));
            let data = bound(json!({"foo": false}));

            let resolution = resolve(&field, "foo", &PriorInput::default(), Some(&data));
            assert_eq!(resolution.value, Some(json!(false)));
            assert_eq!(resolution.source, ValueSource::BoundData);
        }

        #[test]
        fn test_default_when_nothing_else() {
            let field = Field::text("foo").with_default(json!("default"));
            let data = bound(json!({"other": 1}));

            let resolution = resolve(&field, "foo", &PriorInput::default(), Some(&data));
            assert_eq!(resolution.value, Some(json!("default")));
            assert_eq!(resolution.source, ValueSource::Default);
        }

        #[test]
        fn test_unresolved_without_any_source() {
            let resolution = resolve(&Field::text("foo"), "foo", &PriorInput::default(), None);
            assert_eq!(resolution.value, None);
            assert_eq!(resolution.source, ValueSource::Unresolved);
        }
    }

    mod key_paths {
        use super::*;

        #[test]
        fn test_prior_uses_full_path_bound_uses_local_name() {
            let field = Field::text("name");
            let prior = PriorInput::new(json!({"p:child": [{"name": "from prior"}]}));
            let data = bound(json!({"name": "from model"}));

            let hit = resolve(&field, "p:child[0][name]", &prior, Some(&data));
            assert_eq!(hit.value, Some(json!("from prior")));

            let miss = resolve(&field, "p:child[1][name]", &prior, Some(&data));
            assert_eq!(miss.value, Some(json!("from model")));
        }

        #[test]
        fn test_nested_local_names_traverse_bound_data() {
            let field = Field::text("person[name]");
            let data = bound(json!({"person": {"name": "Ada"}}));
            let resolution = resolve(&field, "person[name]", &PriorInput::default(), Some(&data));
            assert_eq!(resolution.value, Some(json!("Ada")));
        }
    }

    mod kinds {
        use super::*;

        #[test]
        fn test_password_ignores_prior_and_bound() {
            let field = Field::password("secret");
            let prior = PriorInput::new(json!({"secret": "typed"}));
            let data = bound(json!({"secret": "hash"}));
            let resolution = resolve(&field, "secret", &prior, Some(&data));
            assert_eq!(resolution.source, ValueSource::Unresolved);
        }

        #[test]
        fn test_checkbox_absent_everywhere_is_off() {
            let mut field = Field::checkbox("active");
            let resolution = resolve(&field, "active", &PriorInput::default(), None);
            field.resolve("active".to_string(), resolution.value, resolution.source);
            assert!(!field.is_checked());
        }

        #[test]
        fn test_checkbox_from_bound_true() {
            let mut field = Field::checkbox("active");
            let data = bound(json!({"active": true}));
            let resolution = resolve(&field, "active", &PriorInput::default(), Some(&data));
            field.resolve("active".to_string(), resolution.value, resolution.source);
            assert!(field.is_checked());
        }
    }
}
