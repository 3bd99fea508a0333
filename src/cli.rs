//! Minimal CLI: schema documents in, GBNF grammar out.
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::assemble::grammar_from_type;
use crate::schema::{self, SchemaDoc};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON Schema documents into GBNF grammars for constrained decoding
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile schema documents and emit grammar text
    Compile(CompileSettings),
    /// parse schema documents and report which ones convert cleanly
    Check(CheckSettings),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// jq filter applied to each document before schema conversion
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct CompileSettings {
    #[command(flatten)]
    input_settings: InputSettings,

    /// accept a JSON array of root objects instead of a single one
    #[arg(long, default_value_t = false)]
    list_of_outputs: bool,

    /// output .gbnf file (stdout if omitted); a directory when several inputs match
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(Args, Debug)]
struct CheckSettings {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Compile(target) => target.run(),
            Command::Check(target) => target.run(),
        }
    }
}

impl InputSettings {
    fn load_documents(&self) -> anyhow::Result<Vec<(PathBuf, SchemaDoc)>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("reading {}", source_path.display()))?;
            match self.jq_expr.as_ref() {
                None => {
                    let doc = schema::parse(&source)
                        .with_context(|| format!("parsing {}", source_path.display()))?;
                    documents.push((source_path, doc));
                }
                Some(jq_expr) => {
                    let json_value = serde_json::from_str::<serde_json::Value>(&source)
                        .with_context(|| format!("parsing {}", source_path.display()))?;
                    let selected = crate::jq::apply_filter(jq_expr, &json_value)
                        .with_context(|| format!("filtering {}", source_path.display()))?;
                    for value in selected {
                        let doc = serde_json::from_value::<SchemaDoc>(value).with_context(|| {
                            format!("converting filtered value from {}", source_path.display())
                        })?;
                        documents.push((source_path.clone(), doc));
                    }
                }
            }
        }
        Ok(documents)
    }
}

impl CompileSettings {
    fn run(&self) -> anyhow::Result<()> {
        // debug path
        if self.no_op {
            eprintln!("{self:#?}");
            return Ok(());
        }

        let documents = self.input_settings.load_documents()?;
        anyhow::ensure!(!documents.is_empty(), "no schema documents matched the inputs");

        // Each compilation owns its context; fan out across inputs.
        let grammars = documents
            .par_iter()
            .map(|(path, doc)| -> anyhow::Result<(PathBuf, String)> {
                let ty = schema::to_ty(doc)
                    .with_context(|| format!("converting {}", path.display()))?;
                let grammar = grammar_from_type(&ty, self.list_of_outputs)
                    .with_context(|| format!("compiling {}", path.display()))?;
                Ok((path.clone(), grammar))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        match self.out.as_ref() {
            None => {
                for (_, grammar) in &grammars {
                    println!("{grammar}");
                }
            }
            Some(out) if grammars.len() == 1 => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(out, format!("{}\n", grammars[0].1))?;
            }
            Some(out_dir) => {
                std::fs::create_dir_all(out_dir)?;
                for (path, grammar) in &grammars {
                    let stem = path.file_stem().unwrap_or(path.as_os_str());
                    let target = out_dir.join(stem).with_extension("gbnf");
                    std::fs::write(&target, format!("{grammar}\n"))?;
                }
            }
        }
        Ok(())
    }
}

impl CheckSettings {
    fn run(&self) -> anyhow::Result<()> {
        let documents = self.input_settings.load_documents()?;
        let mut failures = 0usize;
        for (path, doc) in &documents {
            let outcome = schema::to_ty(doc)
                .map_err(anyhow::Error::from)
                .and_then(|ty| grammar_from_type(&ty, false).map_err(anyhow::Error::from));
            match outcome {
                Ok(_) => println!("{}   {}", "ok".green(), path.display()),
                Err(error) => {
                    failures += 1;
                    println!("{} {}: {error:#}", "fail".red(), path.display());
                }
            }
        }
        if failures > 0 {
            anyhow::bail!("{failures} of {} schema documents failed", documents.len());
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
