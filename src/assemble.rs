//! Document assembly: run the synthesizer in a fresh context, prepend the
//! root rules, append the fixed primitive block and whatever conditional
//! helpers the document actually references, and strip blank lines.

use crate::error::GrammarError;
use crate::ir::Ty;
use crate::synth::{synthesize, Ctx};

// Fixed primitive productions every document ends with.
const PRIMITIVE_BLOCK: &str = r#"boolean ::= "true" | "false"
null ::= "null"
string ::= "\"" (
        [^"\\] |
        "\\" (["\\/bfnrt] | "u" [0-9a-fA-F] [0-9a-fA-F] [0-9a-fA-F] [0-9a-fA-F])
      )* "\"" ws
ws ::= ([ \t\n] ws)?
float ::= ("-"? ([0-9] | [1-9] [0-9]*)) ("." [0-9]+)? ([eE] [-+]? [0-9]+)? ws
integer ::= [0-9]+"#;

// Universal any-value productions, appended only when the opaque catch-all
// (or the `any` primitive) was referenced.
const ANY_VALUE_BLOCK: &str = r#"value ::= object | array | string | number | boolean | null
object ::=
  "{" ws (
            string ":" ws value
    ("," ws string ":" ws value)*
  )? "}" ws
array  ::=
  "[" ws (
            value
    ("," ws value)*
  )? "]" ws
number ::= integer | float"#;

fn list_helper(prim: &str) -> String {
    format!("{prim}-list ::= \"[\" ws ({prim} (\",\" ws {prim})*)? \"]\"")
}

/// Compile `root` into a complete, self-contained grammar document.
///
/// With `list_of_outputs` the root rule accepts a JSON array of root values
/// instead of a single one. Compiling the same type twice yields byte-identical
/// output; every call owns a fresh context.
pub fn grammar_from_type(root: &Ty, list_of_outputs: bool) -> Result<String, GrammarError> {
    let mut ctx = Ctx::default();
    let (root_ref, rules) = synthesize(root, "", "model", &mut ctx)?;

    let mut lines = Vec::with_capacity(rules.len() + 2);
    if list_of_outputs {
        lines.push(r#"root ::= ws "[" grammar-models ("," grammar-models)* "]""#.to_string());
    } else {
        lines.push("root ::= ws grammar-models".to_string());
    }
    lines.push(format!("grammar-models ::= {root_ref}"));
    lines.extend(rules.iter().map(ToString::to_string));

    let mut document = lines.join("\n");

    // Bare `<prim>-list` references are satisfied here rather than at the
    // point of use; skip any name the synthesizer already defined, so every
    // rule name stays defined exactly once.
    let mut tail = Vec::new();
    for prim in ["string", "boolean", "integer", "float"] {
        let helper = format!("{prim}-list");
        if document.contains(&helper) && !ctx.is_registered(&helper) {
            tail.push(list_helper(prim));
        }
    }
    if ctx.uses_any() {
        tail.push(ANY_VALUE_BLOCK.to_string());
    }
    tail.push(PRIMITIVE_BLOCK.to_string());

    document.push('\n');
    document.push_str(&tail.join("\n"));
    Ok(remove_empty_lines(&document))
}

fn remove_empty_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Prim;

    #[test]
    fn removes_blank_lines_only() {
        assert_eq!(remove_empty_lines("a\n\n  \nb\n"), "a\nb");
    }

    #[test]
    fn list_helper_shape_accepts_empty_arrays() {
        assert_eq!(
            list_helper("string"),
            r#"string-list ::= "[" ws (string ("," ws string)*)? "]""#
        );
    }

    #[test]
    fn helper_is_skipped_when_a_rule_already_owns_the_name() {
        // An object named `StringList` defines `string-list` itself; the
        // textual reference check must not add a second definition.
        let root = Ty::object("StringList", vec![("items", Ty::Primitive(Prim::String))]);
        let grammar = grammar_from_type(&root, false).unwrap();
        let definitions = grammar
            .lines()
            .filter(|line| line.starts_with("string-list ::="))
            .count();
        assert_eq!(definitions, 1);
    }
}
