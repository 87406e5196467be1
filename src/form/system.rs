//! System fields added to every root form
//!
//! Runs once, after the root's own fields are resolved. All of them are hidden
//! fields with explicit values and unprefixed names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::error::Result;
use super::field::{Field, ValueSource};
use super::node::NodeId;
use super::tree::FormTree;
use crate::config::FormletsConfig;
use crate::data::TokenSource;

/// HTTP verb a form submits with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// The verb actually sent: GET stays GET, everything else goes out as POST
    pub fn form_method(&self) -> Method {
        match self {
            Method::Get => Method::Get,
            _ => Method::Post,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported form method: {other}")),
        }
    }
}

/// Settings the injector needs from the root form
pub(crate) struct SystemFields<'a> {
    pub method: Method,
    pub spam_trap: bool,
    pub config: &'a FormletsConfig,
    pub session: Option<&'a dyn TokenSource>,
}

impl SystemFields<'_> {
    pub(crate) fn inject(&self, tree: &mut FormTree, root: NodeId) -> Result<()> {
        let config = self.config;

        if config.needs_spoofing(self.method.as_str()) {
            add(tree, root, &config.method_field, json!(self.method.as_str()))?;
        }

        let token = match self.session {
            Some(session) => session.current_token(),
            None => {
                warn!(field = %config.token_field, "no session configured, token field left empty");
                String::new()
            }
        };
        add(tree, root, &config.token_field, Value::String(token))?;

        if self.spam_trap {
            add(tree, root, &config.honeypot_field, json!(""))?;
            add(
                tree,
                root,
                &config.honeytime_field,
                json!(chrono::Utc::now().timestamp()),
            )?;
        }
        Ok(())
    }
}

fn add(tree: &mut FormTree, root: NodeId, name: &str, value: Value) -> Result<()> {
    let field = tree.insert_field(root, Field::hidden(name).with_value(value.clone()))?;
    field.resolve(name.to_string(), Some(value), ValueSource::Explicit);
    Ok(())
}
