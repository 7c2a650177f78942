//! Write the gateway's OpenAPI document as pretty JSON.
//!
//!   cargo run --bin export_openapi                       # stdout
//!   cargo run --bin export_openapi -- --output api.json  # file

use anyhow::Context;
use demo_bank::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn output_path() -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--output" || a == "-o")
        .and_then(|i| args.get(i + 1).cloned())
}

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    match output_path() {
        Some(path) => {
            std::fs::write(&path, &json).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
