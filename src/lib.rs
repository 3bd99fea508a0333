//! Schema-to-grammar compiler.
//!
//! Takes a closed description of a data type (`ir::Ty`), traverses it, and
//! emits a GBNF grammar document that constrains a decoding engine to text
//! parseable as that type. The compiler is pure and per-call: every
//! [`grammar_from_type`] invocation owns its own context, so independent
//! compilations can run on separate threads with nothing shared.
//!
//! Pipeline: `Ty` → `classify` → `synth` (named productions) → `assemble`
//! (root rule, helpers, fixed primitive block).

pub mod assemble;
pub mod classify;
pub mod cli;
pub mod error;
pub mod ir;
pub mod jq;
pub mod names;
pub mod schema;
pub mod synth;

pub use assemble::grammar_from_type;
pub use error::{GrammarError, SchemaError};
pub use ir::{Field, ObjectTy, Prim, Scalar, Ty};
