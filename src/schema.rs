//! JSON Schema adapter: the input boundary for callers that describe types as
//! schema documents rather than building `Ty` by hand.
//!
//! Supported subset: `type`, `title`, `properties`, `items`, `uniqueItems`,
//! `enum`, `const`, `anyOf`/`oneOf`, `additionalProperties`, and `$ref` into
//! `$defs`/`definitions`. Recursive refs are allowed: the target object is
//! declared before its fields convert, so a def can reference itself.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::{Field, ObjectTy, Prim, Scalar, Ty};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaDoc {
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub title: Option<String>,
    pub properties: Option<IndexMap<String, SchemaDoc>>,
    pub items: Option<Box<SchemaDoc>>,
    #[serde(rename = "uniqueItems")]
    pub unique_items: bool,
    #[serde(rename = "enum")]
    pub enum_: Option<Vec<Value>>,
    #[serde(rename = "const")]
    pub const_: Option<Value>,
    #[serde(rename = "anyOf", alias = "oneOf")]
    pub any_of: Option<Vec<SchemaDoc>>,
    #[serde(rename = "additionalProperties")]
    pub additional: Option<AdditionalProps>,
    #[serde(rename = "$defs", alias = "definitions")]
    pub defs: IndexMap<String, SchemaDoc>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProps {
    Allowed(bool),
    Schema(Box<SchemaDoc>),
}

/// Parse a schema document, reporting the JSON path on failure.
pub fn parse(src: &str) -> Result<SchemaDoc, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| SchemaError::Parse {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

/// Convert a parsed schema document into the compiler's type description.
pub fn to_ty(doc: &SchemaDoc) -> Result<Ty, SchemaError> {
    Resolver {
        defs: &doc.defs,
        building: IndexMap::new(),
        in_flight: HashSet::new(),
    }
    .convert(doc, "model")
}

struct Resolver<'a> {
    defs: &'a IndexMap<String, SchemaDoc>,
    /// Def objects declared but not yet sealed; a recursive `$ref` lands here.
    building: IndexMap<String, Arc<ObjectTy>>,
    /// Def keys currently being resolved. Recursion through an object def is
    /// broken by `building`; re-entering any other def is a ref cycle that
    /// never reaches a type, so it fails instead of recursing forever.
    in_flight: HashSet<String>,
}

impl<'a> Resolver<'a> {
    fn convert(&mut self, doc: &SchemaDoc, hint: &str) -> Result<Ty, SchemaError> {
        if let Some(target) = &doc.reference {
            return self.resolve(target);
        }
        if let Some(arms) = &doc.any_of {
            let alternatives = arms
                .iter()
                .map(|arm| self.convert(arm, hint))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Ty::Union(alternatives));
        }
        if let Some(values) = &doc.enum_ {
            return enum_ty(doc, values, hint);
        }
        if let Some(value) = &doc.const_ {
            return Ok(Ty::Literal(vec![scalar(value)?]));
        }
        match doc.ty.as_deref() {
            Some("string") => Ok(Ty::Primitive(Prim::String)),
            Some("boolean") => Ok(Ty::Primitive(Prim::Boolean)),
            Some("integer") => Ok(Ty::Primitive(Prim::Integer)),
            Some("number") => Ok(Ty::Primitive(Prim::Float)),
            Some("null") => Ok(Ty::Primitive(Prim::Null)),
            Some("array") => {
                let element = match &doc.items {
                    Some(items) => self.convert(items, hint)?,
                    None => Ty::Primitive(Prim::Any),
                };
                Ok(if doc.unique_items {
                    Ty::Set(Box::new(element))
                } else {
                    Ty::List(Box::new(element))
                })
            }
            Some("object") | None => self.object(doc, hint),
            Some(other) => Err(SchemaError::Unsupported(format!("type `{other}`"))),
        }
    }

    fn object(&mut self, doc: &SchemaDoc, hint: &str) -> Result<Ty, SchemaError> {
        let name = doc.title.as_deref().unwrap_or(hint);
        if let Some(props) = &doc.properties {
            let obj = ObjectTy::declare(name);
            let mut fields = Vec::with_capacity(props.len());
            for (field_name, field_doc) in props {
                fields.push(Field {
                    name: field_name.clone(),
                    ty: self.convert(field_doc, field_name)?,
                });
            }
            obj.seal(fields);
            return Ok(Ty::Object(obj));
        }
        if let Some(AdditionalProps::Schema(value_doc)) = &doc.additional {
            return Ok(Ty::Dict {
                key: Box::new(Ty::Primitive(Prim::String)),
                value: Box::new(self.convert(value_doc, hint)?),
            });
        }
        if doc.ty.is_none() && doc.title.is_none() {
            // bare `{}` schema: anything goes
            return Ok(Ty::Primitive(Prim::Any));
        }
        Ok(Ty::Opaque { name: name.to_string() })
    }

    fn resolve(&mut self, target: &str) -> Result<Ty, SchemaError> {
        let key = target
            .strip_prefix("#/$defs/")
            .or_else(|| target.strip_prefix("#/definitions/"))
            .ok_or_else(|| SchemaError::UnresolvedRef(target.to_string()))?;
        if let Some(obj) = self.building.get(key) {
            return Ok(Ty::Object(obj.clone()));
        }
        if !self.in_flight.insert(key.to_string()) {
            return Err(SchemaError::Unsupported(format!(
                "$ref cycle through `{target}` never reaches an object"
            )));
        }
        let doc: &'a SchemaDoc = self
            .defs
            .get(key)
            .ok_or_else(|| SchemaError::UnresolvedRef(target.to_string()))?;
        let resolved = match &doc.properties {
            None => self.convert(doc, key),
            Some(props) => {
                let obj = ObjectTy::declare(doc.title.as_deref().unwrap_or(key));
                self.building.insert(key.to_string(), obj.clone());
                let mut fields = Vec::with_capacity(props.len());
                for (field_name, field_doc) in props {
                    fields.push(Field {
                        name: field_name.clone(),
                        ty: self.convert(field_doc, field_name)?,
                    });
                }
                obj.seal(fields);
                Ok(Ty::Object(obj))
            }
        };
        self.in_flight.remove(key);
        resolved
    }
}

fn enum_ty(doc: &SchemaDoc, values: &[Value], hint: &str) -> Result<Ty, SchemaError> {
    if !values.is_empty() && values.iter().all(Value::is_string) {
        let name = doc.title.as_deref().unwrap_or(hint);
        let strings = values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        return Ok(Ty::Enum { name: name.to_string(), values: strings });
    }
    Ok(Ty::Literal(
        values.iter().map(scalar).collect::<Result<Vec<_>, _>>()?,
    ))
}

fn scalar(value: &Value) -> Result<Scalar, SchemaError> {
    match value {
        Value::String(s) => Ok(Scalar::Str(s.clone())),
        Value::Bool(b) => Ok(Scalar::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Scalar::Int(i))
            } else {
                Ok(Scalar::Float(OrderedFloat(n.as_f64().unwrap_or_default())))
            }
        }
        other => Err(SchemaError::Unsupported(format!(
            "enum value `{other}` is not a scalar"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_the_json_path() {
        let err = parse(r#"{"properties": 42}"#).unwrap_err();
        assert!(err.to_string().contains("properties"), "{err}");
    }

    #[test]
    fn unknown_ref_targets_fail() {
        let doc = parse(r##"{"$ref": "#/nope"}"##).unwrap();
        let err = to_ty(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedRef(_)));
    }

    #[test]
    fn ref_cycle_through_a_ref_only_def_fails() {
        let doc = parse(r##"{"$ref": "#/$defs/A", "$defs": {"A": {"$ref": "#/$defs/A"}}}"##)
            .unwrap();
        let err = to_ty(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::Unsupported(_)), "{err}");
    }

    #[test]
    fn mutual_ref_cycle_without_properties_fails() {
        let doc = parse(
            r##"{
                "$ref": "#/$defs/A",
                "$defs": {
                    "A": {"$ref": "#/$defs/B"},
                    "B": {"$ref": "#/$defs/A"}
                }
            }"##,
        )
        .unwrap();
        let err = to_ty(&doc).unwrap_err();
        assert!(matches!(err, SchemaError::Unsupported(_)), "{err}");
    }

    #[test]
    fn a_non_object_def_may_be_referenced_twice() {
        // Two sequential refs to the same alias def are not a cycle.
        let doc = parse(
            r##"{
                "title": "Pair",
                "type": "object",
                "properties": {
                    "a": {"$ref": "#/$defs/Id"},
                    "b": {"$ref": "#/$defs/Id"}
                },
                "$defs": {"Id": {"type": "integer"}}
            }"##,
        )
        .unwrap();
        let ty = to_ty(&doc).unwrap();
        assert!(matches!(ty, Ty::Object(_)));
    }

    #[test]
    fn untitled_empty_schema_is_any() {
        let doc = parse("{}").unwrap();
        let ty = to_ty(&doc).unwrap();
        assert!(matches!(ty, Ty::Primitive(Prim::Any)));
    }

    #[test]
    fn unique_items_become_sets() {
        let doc = parse(r#"{"type": "array", "items": {"type": "integer"}, "uniqueItems": true}"#)
            .unwrap();
        assert!(matches!(to_ty(&doc).unwrap(), Ty::Set(_)));
    }
}
