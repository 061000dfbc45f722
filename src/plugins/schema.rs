use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameter kind tag, checked against the JSON shape of each argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
    /// Opts the parameter out of kind checking.
    Any,
}

impl ParamKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

/// One positional parameter of a plugin method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }
}

/// Return-value descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSpec {
    pub kind: ParamKind,
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for ReturnSpec {
    fn default() -> Self {
        Self {
            kind: ParamKind::Any,
            description: None,
        }
    }
}

/// Schema for one plugin method: ordered parameters plus a return
/// descriptor. Immutable after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSchema {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub returns: ReturnSpec,
}

impl MethodSchema {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self {
            description: None,
            params,
            returns: ReturnSpec::default(),
        }
    }

    /// Check ordered arguments against the declared parameter list:
    /// arity, required flags, and kind tags. A JSON `null` counts as an
    /// absent argument.
    pub fn validate_params(&self, params: &[Value]) -> Result<(), String> {
        if params.len() > self.params.len() {
            return Err(format!(
                "expected at most {} params, got {}",
                self.params.len(),
                params.len()
            ));
        }
        for (index, spec) in self.params.iter().enumerate() {
            match params.get(index) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(format!("missing required param '{}'", spec.name));
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(format!(
                            "param '{}' expects {:?}, got {}",
                            spec.name,
                            spec.kind,
                            json_kind_name(value)
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn json_kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
