// Strongly-typed description of a value's shape. The compiler consumes this
// and nothing else; adapters (schema.rs) build it from external sources.

use std::sync::{Arc, OnceLock};

use ordered_float::OrderedFloat;

#[derive(Debug, Clone)]
pub enum Ty {
    Primitive(Prim),
    Enum { name: String, values: Vec<String> },
    Literal(Vec<Scalar>),
    List(Box<Ty>),
    Set(Box<Ty>),
    Dict { key: Box<Ty>, value: Box<Ty> },
    Union(Vec<Ty>),
    Optional(Box<Ty>),
    Object(Arc<ObjectTy>),
    Opaque { name: String },         // no introspectable fields; catch-all
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prim {
    String,
    Boolean,
    Integer,
    Float,
    Null,
    Any,
}

impl Prim {
    /// The fixed rule name this primitive resolves to in the emitted grammar.
    pub fn rule_name(self) -> &'static str {
        match self {
            Prim::String => "string",
            Prim::Boolean => "boolean",
            Prim::Integer => "integer",
            Prim::Float => "float",
            Prim::Null => "null",
            Prim::Any => "value",
        }
    }
}

/// Scalar usable inside `Ty::Literal`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
}

/// A named object type. Fields live behind a `OnceLock` so callers can build
/// cyclic graphs: declare the object, hand `Arc` clones to whoever needs to
/// reference it, then seal the field list once.
#[derive(Debug)]
pub struct ObjectTy {
    name: String,
    fields: OnceLock<Vec<Field>>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
}

impl ObjectTy {
    pub fn declare(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            fields: OnceLock::new(),
        })
    }

    /// Seal the field list. The first seal wins; later calls are ignored.
    pub fn seal(&self, fields: Vec<Field>) {
        let _ = self.fields.set(fields);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order. Empty until sealed.
    pub fn fields(&self) -> &[Field] {
        self.fields.get().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Ty {
    /// Acyclic object shorthand: declare and seal in one step.
    pub fn object(name: &str, fields: Vec<(&str, Ty)>) -> Ty {
        let obj = ObjectTy::declare(name);
        obj.seal(
            fields
                .into_iter()
                .map(|(name, ty)| Field { name: name.to_string(), ty })
                .collect(),
        );
        Ty::Object(obj)
    }

    pub fn list(element: Ty) -> Ty {
        Ty::List(Box::new(element))
    }

    pub fn set(element: Ty) -> Ty {
        Ty::Set(Box::new(element))
    }

    pub fn dict(key: Ty, value: Ty) -> Ty {
        Ty::Dict { key: Box::new(key), value: Box::new(value) }
    }

    pub fn optional(inner: Ty) -> Ty {
        Ty::Optional(Box::new(inner))
    }

    pub fn enumeration(name: &str, values: &[&str]) -> Ty {
        Ty::Enum {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Short human-readable shape description, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Ty::Primitive(p) => p.rule_name().to_string(),
            Ty::Enum { name, .. } => format!("enum {name}"),
            Ty::Literal(_) => "literal".to_string(),
            Ty::List(_) => "list".to_string(),
            Ty::Set(_) => "set".to_string(),
            Ty::Dict { .. } => "dict".to_string(),
            Ty::Union(_) => "union".to_string(),
            Ty::Optional(_) => "optional".to_string(),
            Ty::Object(obj) => format!("object {}", obj.name()),
            Ty::Opaque { name } => format!("opaque {name}"),
        }
    }
}
