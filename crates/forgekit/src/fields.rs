//! Declarative field metadata.
//!
//! Each resource bundle describes its operation selector and input fields as
//! [`Property`] values. A host renders them (or, in the CLI, prints them);
//! the library itself never reads them back when executing.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use crate::registry::{Operation, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    DateTime,
    Color,
    Options,
    Collection,
}

/// One selectable value of an `options` property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyOption {
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl PropertyOption {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
            action: None,
        }
    }
}

/// Visibility rule: the property is shown when every listed parameter has
/// one of the listed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayOptions {
    pub show: BTreeMap<String, Vec<String>>,
}

/// A single input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_data_expression: bool,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyOption>,
    /// Child fields of a collection.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Property>,
}

impl Property {
    fn base(kind: PropertyType, name: &str, display_name: &str, default: Value) -> Self {
        Self {
            display_name: display_name.to_string(),
            name: name.to_string(),
            kind,
            required: false,
            no_data_expression: false,
            default,
            placeholder: None,
            description: None,
            display_options: None,
            options: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn string(name: &str, display_name: &str) -> Self {
        Self::base(PropertyType::String, name, display_name, json!(""))
    }

    pub fn number(name: &str, display_name: &str, default: u64) -> Self {
        Self::base(PropertyType::Number, name, display_name, json!(default))
    }

    pub fn date_time(name: &str, display_name: &str) -> Self {
        Self::base(PropertyType::DateTime, name, display_name, json!(""))
    }

    pub fn color(name: &str, display_name: &str) -> Self {
        Self::base(PropertyType::Color, name, display_name, json!(""))
    }

    pub fn boolean(name: &str, display_name: &str, default: bool) -> Self {
        Self::base(PropertyType::Boolean, name, display_name, json!(default))
    }

    /// An `options` property over plain string values.
    pub fn options(name: &str, display_name: &str, values: &[(&str, &str)], default: &str) -> Self {
        let mut property = Self::base(PropertyType::Options, name, display_name, json!(default));
        property.options = values
            .iter()
            .map(|(label, value)| PropertyOption::new(*label, *value))
            .collect();
        property
    }

    /// A group of optional fields, read as a nested object.
    pub fn collection(name: &str, display_name: &str, fields: Vec<Property>) -> Self {
        let mut property = Self::base(PropertyType::Collection, name, display_name, json!({}));
        property.placeholder = Some("Add Field".to_string());
        property.fields = fields;
        property
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Show this property only for `resource` and the given operations.
    #[must_use]
    pub fn show(mut self, resource: Resource, operations: &[Operation]) -> Self {
        let mut show = BTreeMap::new();
        show.insert("resource".to_string(), vec![resource.as_str().to_string()]);
        if !operations.is_empty() {
            show.insert(
                "operation".to_string(),
                operations.iter().map(|op| op.as_str().to_string()).collect(),
            );
        }
        self.display_options = Some(DisplayOptions { show });
        self
    }

    /// Whether this property is visible for the given pair.
    pub fn is_shown_for(&self, resource: Resource, operation: Operation) -> bool {
        let Some(display) = &self.display_options else {
            return true;
        };
        let matches = |key: &str, value: &str| {
            display
                .show
                .get(key)
                .is_none_or(|allowed| allowed.iter().any(|a| a == value))
        };
        matches("resource", resource.as_str()) && matches("operation", operation.as_str())
    }
}

/// The operation selector for one resource.
///
/// Options are listed alphabetically by label, each with an action string.
pub fn operation_selector(
    resource: Resource,
    operations: &[(Operation, &str)],
    default: Operation,
) -> Property {
    let mut options: Vec<PropertyOption> = operations
        .iter()
        .map(|(operation, action)| PropertyOption {
            action: Some((*action).to_string()),
            ..PropertyOption::new(operation.display_name(), operation.as_str())
        })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));

    let mut property = Property::base(
        PropertyType::Options,
        "operation",
        "Operation",
        json!(default.as_str()),
    )
    .show(resource, &[]);
    property.no_data_expression = true;
    property.options = options;
    property
}

/// `"pullRequest"` -> `"Pull Request"`.
pub fn title_case(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len() + 4);
    for (i, ch) in identifier.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out
}
