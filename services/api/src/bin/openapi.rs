//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the proxy endpoint. The output path is the
//! first argument, or `openapi.json` in the current directory.

use scheduler_api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let doc = ApiDoc::openapi();
    let operations = doc.paths.paths.len();
    std::fs::write(&output, doc.to_pretty_json()?)?;

    println!("Wrote {} path(s) to {}", operations, output);
    Ok(())
}
