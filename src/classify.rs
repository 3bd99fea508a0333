//! Type classifier: map a `Ty` to the semantic category that drives rule
//! synthesis. Total over the closed variant set; the only fallback is the
//! explicitly modeled `Opaque` catch-all, which is preserved, never dropped.

use std::sync::Arc;

use crate::ir::{ObjectTy, Prim, Scalar, Ty};

/// Tagged category with borrowed payloads, matched exhaustively by the
/// synthesizer.
#[derive(Debug)]
pub enum Category<'a> {
    Primitive(Prim),
    Enum { name: &'a str, values: &'a [String] },
    Literal(&'a [Scalar]),
    /// Lists and sets render identically (a JSON array).
    Collection(&'a Ty),
    Dict { key: &'a Ty, value: &'a Ty },
    Optional(&'a Ty),
    /// Two or more alternatives, null arms already stripped.
    Union(Vec<&'a Ty>),
    Object(&'a Arc<ObjectTy>),
    Opaque(&'a str),
}

pub fn classify(t: &Ty) -> Category<'_> {
    match t {
        Ty::Primitive(p) => Category::Primitive(*p),
        Ty::Enum { name, values } => Category::Enum { name: name.as_str(), values },
        Ty::Literal(values) => Category::Literal(values),
        Ty::List(element) | Ty::Set(element) => Category::Collection(element),
        Ty::Dict { key, value } => Category::Dict { key, value },
        Ty::Optional(inner) => Category::Optional(inner),
        Ty::Union(alternatives) => {
            // Null arms are handled by the optional rendering, never mixed
            // into a multi-way union.
            let arms: Vec<&Ty> = alternatives
                .iter()
                .filter(|alt| !matches!(alt, Ty::Primitive(Prim::Null)))
                .collect();
            match arms.len() {
                0 => Category::Primitive(Prim::Null),
                1 => Category::Optional(arms[0]),
                _ => Category::Union(arms),
            }
        }
        Ty::Object(obj) => Category::Object(obj),
        Ty::Opaque { name } => Category::Opaque(name),
    }
}
