//! jq pre-filtering via jaq. Lets callers point the compiler at a schema
//! buried inside a larger document (e.g. an OpenAPI components section).

use anyhow::{anyhow, Result};
use jaq_core::{load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input` and return every value the filter produces.
pub fn apply_filter(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errors| {
        let rendered = errors
            .into_iter()
            .map(|(file, error)| format!("jq parse error: {error:?} in `{}`", file.code))
            .collect::<Vec<_>>()
            .join("\n");
        anyhow!(rendered)
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errors| {
            let rendered = errors
                .into_iter()
                .flat_map(|(file, list)| {
                    let code = file.code.to_string();
                    list.into_iter().map(move |(name, undefined)| {
                        format!("undefined `{name}`: {undefined:?} in `{code}`")
                    })
                })
                .collect::<Vec<_>>()
                .join("\n");
            anyhow!(rendered)
        })?;

    let inputs = RcIter::new(core::iter::empty());
    let mut out = Vec::new();
    for item in filter.run((Ctx::new([], &inputs), Val::from(input.clone()))) {
        let val = item.map_err(|error| anyhow!("jq runtime error: {error:?}"))?;
        // Val displays as JSON text; round-trip through serde for a Value.
        out.push(serde_json::from_str(&val.to_string())?);
    }
    Ok(out)
}
