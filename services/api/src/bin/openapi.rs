//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the ear trainer API.
//!
//! Usage: `openapi [OUTPUT]`. The document goes to `openapi.json` in the
//! current directory unless another path is given.

use api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let document = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&output, document)?;
    println!(
        "Wrote OpenAPI document ({} paths) to {}",
        ApiDoc::openapi().paths.paths.len(),
        output.display()
    );
    Ok(())
}
