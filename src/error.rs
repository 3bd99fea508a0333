use thiserror::Error;

/// Failures while compiling a `Ty` into a grammar document. All of these fail
/// the whole compilation; there is no partial or degraded output.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// A shape the grammar format cannot express, e.g. a dictionary whose key
    /// type does not render as a JSON string.
    #[error("unsupported type shape: {0}")]
    UnsupportedTypeShape(String),

    /// Two structurally different sub-rules derived the same rule name.
    /// Conflating them would silently keep whichever was generated first, so
    /// this is a hard error instead.
    #[error("rule name collision: `{name}` resolves to two different bodies")]
    NameCollision { name: String },

    /// Nesting bound tripped on a pathologically deep (non-cyclic) type
    /// graph. Cycles are broken by the visited set and never land here.
    #[error("type graph nesting exceeded {max} levels")]
    RecursionGuard { max: usize },
}

/// Failures while adapting a JSON Schema document into a `Ty`.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema parse error at `{path}`: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("unresolved $ref `{0}`")]
    UnresolvedRef(String),

    #[error("unsupported schema construct: {0}")]
    Unsupported(String),
}
