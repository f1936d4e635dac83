//! Schema tree types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declarative description of an expected JSON shape.
///
/// Schemas are plain values: build once, share by reference, never mutate.
///
/// Deserialization rejects keys that do not belong to the declared `type`,
/// so a misspelled constraint is a load error rather than a silent no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", try_from = "SchemaNode")]
pub enum Schema {
    /// Any value, including `null`.
    Any {},
    /// A JSON string with optional format constraints.
    String {
        /// Well-formedness grammar the string must follow.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<StringFormat>,
        /// Exact length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<usize>,
    },
    /// A JSON number with optional bounds.
    Number {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// A JSON boolean.
    Boolean {},
    /// A calendar date or timestamp, as an ISO string or epoch milliseconds.
    Date {},
    /// A JSON object with declared fields.
    Object {
        /// Declared fields by name.
        #[serde(default)]
        fields: BTreeMap<String, Field>,
        /// Policy for keys not declared in `fields`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unknown: Option<UnknownFields>,
    },
    /// A JSON array whose elements share a schema.
    Array {
        /// Schema every element must satisfy.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<Schema>>,
        /// Minimum number of elements.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum number of elements.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// Reference to a named schema, resolved before validation.
    Ref {
        /// Name of the referenced schema.
        name: String,
    },
}

/// String formats recognised by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    /// Absolute URI with a scheme.
    Uri,
    /// Email address.
    Email,
}

/// What to do with object keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    /// Undeclared keys are violations.
    Reject,
    /// Undeclared keys are ignored.
    Allow,
}

/// A declared object field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaNode")]
pub struct Field {
    /// Schema of the field's value.
    #[serde(flatten)]
    pub schema: Schema,
    /// Whether the key must be present.
    #[serde(default)]
    pub required: bool,
    /// Whether `null` is accepted in addition to the declared type.
    #[serde(default)]
    pub allow_null: bool,
    /// Whether `""` is accepted by a string field.
    #[serde(default)]
    pub allow_empty: bool,
}

impl Field {
    /// A field that must be present.
    #[must_use]
    pub const fn required(schema: Schema) -> Self {
        Self {
            schema,
            required: true,
            allow_null: false,
            allow_empty: false,
        }
    }

    /// A field that may be absent.
    #[must_use]
    pub const fn optional(schema: Schema) -> Self {
        Self {
            schema,
            required: false,
            allow_null: false,
            allow_empty: false,
        }
    }

    /// Also accepts `null`.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Also accepts the empty string.
    #[must_use]
    pub const fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }
}

impl Schema {
    /// Any value.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any {}
    }

    /// Plain string.
    #[must_use]
    pub const fn string() -> Self {
        Self::String {
            format: None,
            length: None,
        }
    }

    /// String that is an absolute URI.
    #[must_use]
    pub const fn uri() -> Self {
        Self::String {
            format: Some(StringFormat::Uri),
            length: None,
        }
    }

    /// String that is an email address.
    #[must_use]
    pub const fn email() -> Self {
        Self::String {
            format: Some(StringFormat::Email),
            length: None,
        }
    }

    /// String of exactly `length` characters.
    #[must_use]
    pub const fn string_of_length(length: usize) -> Self {
        Self::String {
            format: None,
            length: Some(length),
        }
    }

    /// Any number.
    #[must_use]
    pub const fn number() -> Self {
        Self::Number {
            minimum: None,
            maximum: None,
        }
    }

    /// Boolean.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Boolean {}
    }

    /// Date or timestamp.
    #[must_use]
    pub const fn date() -> Self {
        Self::Date {}
    }

    /// Object with the given fields. Undeclared keys are rejected unless
    /// [`Schema::allow_unknown`] is applied; an object with no declared
    /// fields accepts any keys.
    #[must_use]
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Field)>,
        K: Into<String>,
    {
        Self::Object {
            fields: fields.into_iter().map(|(k, f)| (k.into(), f)).collect(),
            unknown: None,
        }
    }

    /// Array whose every element satisfies `items`.
    #[must_use]
    pub fn array_of(items: Self) -> Self {
        Self::Array {
            items: Some(Box::new(items)),
            min_items: None,
            max_items: None,
        }
    }

    /// Reference to a named schema.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Ref { name: name.into() }
    }

    /// Sets the unknown-field policy of an object schema to `allow`.
    ///
    /// Non-object schemas are returned unchanged.
    #[must_use]
    pub fn allow_unknown(self) -> Self {
        self.with_unknown(UnknownFields::Allow)
    }

    /// Sets the unknown-field policy of an object schema to `reject`.
    #[must_use]
    pub fn reject_unknown(self) -> Self {
        self.with_unknown(UnknownFields::Reject)
    }

    fn with_unknown(self, policy: UnknownFields) -> Self {
        match self {
            Self::Object { fields, .. } => Self::Object {
                fields,
                unknown: Some(policy),
            },
            other => other,
        }
    }

    /// Returns the short type name used in violation messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Any {} => "any",
            Self::String { .. } => "string",
            Self::Number { .. } => "number",
            Self::Boolean {} => "boolean",
            Self::Date {} => "date",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
            Self::Ref { .. } => "ref",
        }
    }

    /// Replaces every [`Schema::Ref`] with its definition from `registry`.
    ///
    /// # Errors
    ///
    /// Returns the name of the first reference with no definition, or of a
    /// reference that (directly or indirectly) refers to itself.
    pub fn resolve(&self, registry: &BTreeMap<String, Self>) -> Result<Self, String> {
        self.resolve_inner(registry, &mut Vec::new())
    }

    fn resolve_inner(
        &self,
        registry: &BTreeMap<String, Self>,
        stack: &mut Vec<String>,
    ) -> Result<Self, String> {
        match self {
            Self::Ref { name } => {
                if stack.contains(name) {
                    return Err(name.clone());
                }
                let target = registry.get(name).ok_or_else(|| name.clone())?;
                stack.push(name.clone());
                let resolved = target.resolve_inner(registry, stack);
                stack.pop();
                resolved
            }
            Self::Object { fields, unknown } => {
                let mut resolved = BTreeMap::new();
                for (key, field) in fields {
                    resolved.insert(
                        key.clone(),
                        Field {
                            schema: field.schema.resolve_inner(registry, stack)?,
                            required: field.required,
                            allow_null: field.allow_null,
                            allow_empty: field.allow_empty,
                        },
                    );
                }
                Ok(Self::Object {
                    fields: resolved,
                    unknown: *unknown,
                })
            }
            Self::Array {
                items,
                min_items,
                max_items,
            } => Ok(Self::Array {
                items: match items {
                    Some(items) => Some(Box::new(items.resolve_inner(registry, stack)?)),
                    None => None,
                },
                min_items: *min_items,
                max_items: *max_items,
            }),
            other => Ok(other.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SchemaKind {
    Any,
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
    Ref,
}

impl SchemaKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Object => "object",
            Self::Array => "array",
            Self::Ref => "ref",
        }
    }

    const fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Any | Self::Boolean | Self::Date => &[],
            Self::String => &["format", "length"],
            Self::Number => &["minimum", "maximum"],
            Self::Object => &["fields", "unknown"],
            Self::Array => &["items", "min_items", "max_items"],
            Self::Ref => &["name"],
        }
    }
}

/// Wire form shared by [`Schema`] and [`Field`]: every key a node may carry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaNode {
    #[serde(rename = "type")]
    kind: SchemaKind,
    format: Option<StringFormat>,
    length: Option<usize>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    fields: Option<BTreeMap<String, Field>>,
    unknown: Option<UnknownFields>,
    items: Option<Box<Schema>>,
    min_items: Option<usize>,
    max_items: Option<usize>,
    name: Option<String>,
    required: Option<bool>,
    allow_null: Option<bool>,
    allow_empty: Option<bool>,
}

impl SchemaNode {
    fn present_keys(&self) -> Vec<&'static str> {
        [
            ("format", self.format.is_some()),
            ("length", self.length.is_some()),
            ("minimum", self.minimum.is_some()),
            ("maximum", self.maximum.is_some()),
            ("fields", self.fields.is_some()),
            ("unknown", self.unknown.is_some()),
            ("items", self.items.is_some()),
            ("min_items", self.min_items.is_some()),
            ("max_items", self.max_items.is_some()),
            ("name", self.name.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, set)| set.then_some(key))
        .collect()
    }

    fn into_schema(self) -> Result<Schema, String> {
        let allowed = self.kind.keys();
        if let Some(key) = self.present_keys().into_iter().find(|k| !allowed.contains(k)) {
            return Err(format!(
                "`{key}` does not apply to type `{}`",
                self.kind.as_str()
            ));
        }
        Ok(match self.kind {
            SchemaKind::Any => Schema::Any {},
            SchemaKind::String => Schema::String {
                format: self.format,
                length: self.length,
            },
            SchemaKind::Number => Schema::Number {
                minimum: self.minimum,
                maximum: self.maximum,
            },
            SchemaKind::Boolean => Schema::Boolean {},
            SchemaKind::Date => Schema::Date {},
            SchemaKind::Object => Schema::Object {
                fields: self.fields.unwrap_or_default(),
                unknown: self.unknown,
            },
            SchemaKind::Array => Schema::Array {
                items: self.items,
                min_items: self.min_items,
                max_items: self.max_items,
            },
            SchemaKind::Ref => Schema::Ref {
                name: self.name.ok_or("type `ref` requires `name`")?,
            },
        })
    }
}

impl TryFrom<SchemaNode> for Schema {
    type Error = String;

    fn try_from(node: SchemaNode) -> Result<Self, Self::Error> {
        let modifier = [
            ("required", node.required.is_some()),
            ("allow_null", node.allow_null.is_some()),
            ("allow_empty", node.allow_empty.is_some()),
        ]
        .into_iter()
        .find_map(|(key, set)| set.then_some(key));
        if let Some(key) = modifier {
            return Err(format!("`{key}` is only valid on an object field"));
        }
        node.into_schema()
    }
}

impl TryFrom<SchemaNode> for Field {
    type Error = String;

    fn try_from(node: SchemaNode) -> Result<Self, Self::Error> {
        let required = node.required.unwrap_or(false);
        let allow_null = node.allow_null.unwrap_or(false);
        let allow_empty = node.allow_empty.unwrap_or(false);
        Ok(Self {
            schema: node.into_schema()?,
            required,
            allow_null,
            allow_empty,
        })
    }
}
