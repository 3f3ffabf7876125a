//! Minimal component model seen by the hooks
//!
//! The real component tree lives in the host framework. Hooks only need to
//! know what kind of component they are looking at, its value expression and
//! a handful of attributes they are allowed to change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a UI component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ComponentKind {
    /// Single line text input
    InputText,
    /// Password input
    InputSecret,
    /// Multi line text input
    InputTextarea,
    /// Single choice selection
    SelectOne,
    /// Read-only output
    Output,
    /// Button or link
    Command,
    /// Layout container
    Panel,
}

impl ComponentKind {
    /// Whether the component accepts a submitted value.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::InputText | Self::InputSecret | Self::InputTextarea | Self::SelectOne
        )
    }

    /// Whether the component is a text field of some sort.
    pub fn is_text_input(&self) -> bool {
        matches!(
            self,
            Self::InputText | Self::InputSecret | Self::InputTextarea
        )
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InputText => "input_text",
            Self::InputSecret => "input_secret",
            Self::InputTextarea => "input_textarea",
            Self::SelectOne => "select_one",
            Self::Output => "output",
            Self::Command => "command",
            Self::Panel => "panel",
        };
        f.write_str(name)
    }
}

/// A component as handed to interceptors and initializers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    client_id: String,
    kind: ComponentKind,
    value_expression: Option<String>,
    required: bool,
    attributes: Map<String, Value>,
}

impl Component {
    /// Create a component without a value binding.
    pub fn new(client_id: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            client_id: client_id.into(),
            kind,
            value_expression: None,
            required: false,
            attributes: Map::new(),
        }
    }

    /// Bind the component value to an expression such as `#{bean.property}`.
    #[must_use = "This method returns a new Component and does not modify self"]
    pub fn with_value_expression(mut self, expression: impl Into<String>) -> Self {
        self.value_expression = Some(expression.into());
        self
    }

    /// Client ID of the component.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Kind of the component.
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// The value expression, if the component is bound.
    pub fn value_expression(&self) -> Option<&str> {
        self.value_expression.as_deref()
    }

    /// Whether a value must be submitted.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Mark the component as required or optional.
    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }

    /// Read a pass-through attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set a pass-through attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }
}
