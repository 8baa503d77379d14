// Export the OpenAPI spec to stdout
//
// Usage: cargo run --bin export-openapi > openapi.json

use vitrine_server::openapi::ApiDoc;

fn main() -> Result<(), serde_json::Error> {
    println!("{}", ApiDoc::to_json()?);
    Ok(())
}
