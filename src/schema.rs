//! Declarative structural contracts for flow inputs and outputs.
//!
//! A [`Schema`] lists the fields a JSON record must carry. [`Schema::validate`]
//! walks a `serde_json::Value` against it and reports the first offending
//! field; [`Schema::parse`] additionally deserializes the record into its typed
//! form. The same schema renders to JSON Schema so the provider can be told the
//! shape its reply must take.

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::error::ValidationError;

const ROOT: &str = "<root>";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Text,
    Integer,
    Enum(&'static [&'static str]),
    Array(Box<FieldType>),
    Object(Schema),
}

impl FieldType {
    pub fn array(items: FieldType) -> Self {
        FieldType::Array(Box::new(items))
    }

    fn json_schema(&self) -> Value {
        match self {
            FieldType::Text => json!({ "type": "string" }),
            FieldType::Integer => json!({ "type": "integer" }),
            FieldType::Enum(variants) => json!({ "type": "string", "enum": variants }),
            FieldType::Array(items) => json!({ "type": "array", "items": items.json_schema() }),
            FieldType::Object(schema) => schema.to_json_schema(),
        }
    }

    fn check(&self, schema: &'static str, path: &str, value: &Value) -> Result<(), ValidationError> {
        let mismatch = |expected: &str| {
            ValidationError::new(schema, path, format!("must be {}, got {}", expected, type_name(value)))
        };

        match self {
            FieldType::Text => value.as_str().map(|_| ()).ok_or_else(|| mismatch("a string")),
            FieldType::Integer => {
                if value.is_i64() {
                    Ok(())
                } else if value.is_u64() {
                    Err(ValidationError::new(schema, path, "is out of range for a signed 64-bit integer"))
                } else {
                    Err(mismatch("an integer"))
                }
            }
            FieldType::Enum(variants) => {
                let text = value.as_str().ok_or_else(|| mismatch("a string"))?;
                if variants.contains(&text) {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        schema,
                        path,
                        format!("must be one of: {}", variants.join(", ")),
                    ))
                }
            }
            FieldType::Array(items) => {
                let elements = value.as_array().ok_or_else(|| mismatch("an array"))?;
                elements
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, element)| items.check(schema, &format!("{}[{}]", path, i), element))
            }
            FieldType::Object(nested) => {
                let object = value.as_object().ok_or_else(|| mismatch("an object"))?;
                nested.check_fields(schema, path, object)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldType,
    pub required: bool,
    pub description: &'static str,
}

impl Field {
    pub fn required(name: &'static str, kind: FieldType) -> Self {
        Self {
            name,
            kind,
            required: true,
            description: "",
        }
    }

    pub fn optional(name: &'static str, kind: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

/// An object-shaped record contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn object(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Checks `value` against the schema. Unknown fields are ignored; a
    /// `null` optional field counts as absent.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let object = value.as_object().ok_or_else(|| {
            ValidationError::new(
                self.name,
                ROOT,
                format!("must be an object, got {}", type_name(value)),
            )
        })?;
        self.check_fields(self.name, "", object)
    }

    /// Validates and deserializes in one step.
    pub fn parse<T: DeserializeOwned>(&self, value: Value) -> Result<T, ValidationError> {
        self.validate(&value)?;
        serde_json::from_value(value).map_err(|e| ValidationError::new(self.name, ROOT, e.to_string()))
    }

    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| {
                let mut property = field.kind.json_schema();
                if !field.description.is_empty() {
                    property["description"] = Value::from(field.description);
                }
                (field.name.to_string(), property)
            })
            .collect();
        let required: Vec<&str> = self.fields.iter().filter(|f| f.required).map(|f| f.name).collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    // Errors are reported against the outermost schema so callers see which
    // record failed, with the nested path in `field`.
    fn check_fields(
        &self,
        schema: &'static str,
        prefix: &str,
        object: &Map<String, Value>,
    ) -> Result<(), ValidationError> {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.to_string()
            } else {
                format!("{}.{}", prefix, field.name)
            };
            match object.get(field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(ValidationError::new(schema, path, "is required"));
                }
                None | Some(Value::Null) => {}
                Some(value) => field.kind.check(schema, &path, value)?,
            }
        }
        Ok(())
    }
}

/// A record type bound to its declared schema.
pub trait Contract: DeserializeOwned {
    fn schema() -> &'static Schema;

    fn from_value(value: Value) -> Result<Self, ValidationError> {
        Self::schema().parse(value)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
