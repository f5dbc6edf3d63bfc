//! Integrity manifest utility for thyrodx model exports.
//!
//! Writes `manifest.json` next to a model export, listing the SHA-256
//! digest of `model.json` and of any extra files bound to it. The
//! classifier refuses to load a model whose files no longer match.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_model -- <model_dir|model.json> [--extra <file>]... [--no-check]
//! ```
//!
//! The model is parsed and validated against the clinical record layout
//! before hashing unless `--no-check` is given.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use thyrodx::adapters::model::{resolve_model_file, ExportedModel, IntegrityManifest};
use thyrodx::adapters::ModelClassifier;

struct Args {
    model_path: PathBuf,
    extras: Vec<String>,
    check: bool,
}

fn usage() -> String {
    "Usage: hash_model <model_dir|model.json> [--extra <file>]... [--no-check]".to_string()
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let mut model_path: Option<PathBuf> = None;
    let mut extras = Vec::new();
    let mut check = true;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--extra" => {
                let v = args.next().with_context(usage)?;
                extras.push(v);
            }
            "--no-check" => check = false,
            "-h" | "--help" => bail!(usage()),
            _ => {
                if model_path.is_some() {
                    bail!(usage());
                }
                model_path = Some(PathBuf::from(arg));
            }
        }
    }

    Ok(Args {
        model_path: model_path.with_context(usage)?,
        extras,
        check,
    })
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let model_file = resolve_model_file(&args.model_path);
    if !model_file.is_file() {
        bail!("No model export found at {model_file:?}");
    }

    if args.check {
        let bytes =
            fs::read(&model_file).with_context(|| format!("Failed to read {model_file:?}"))?;
        let model: ExportedModel = serde_json::from_slice(&bytes)
            .with_context(|| format!("{model_file:?} is not a valid model export"))?;
        let classifier = ModelClassifier::from_model(model)
            .with_context(|| format!("{model_file:?} does not fit the clinical record"))?;
        println!("Validated {} model", classifier.estimator_name());
    }

    let manifest = IntegrityManifest::for_model(&model_file, &args.extras)
        .with_context(|| format!("Failed to hash files for {model_file:?}"))?;
    let manifest_path = manifest
        .write_for(&model_file)
        .context("Failed to write manifest.json")?;

    println!("Wrote manifest: {manifest_path:?}");
    for (name, digest) in &manifest.files {
        println!("  {name}  {digest}");
    }

    Ok(())
}
