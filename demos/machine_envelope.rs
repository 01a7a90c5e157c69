//! The JSON envelope and error diagnostics.
//!
//! Run with: cargo run --example machine_envelope

use dx_format::convert::{convert, Format, TransformResult};
use dx_format::{dx, machine, DocumentBuilder, DxSection};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut builder = DocumentBuilder::new();
    builder.context("nm", dx!("dx"));
    builder.context("matrix", dx!([[1, 2], [3, 4]]));

    let mut media = DxSection::new("m", vec!["pt".into(), "sz".into()]);
    media.push_row(vec![dx!("@/media"), dx!(2048)])?;
    builder.section(media);
    let doc = builder.build();

    // Nested arrays have no text form, the envelope keeps them
    let json = machine::to_string_pretty(&doc)?;
    println!("{}\n", json);
    assert_eq!(machine::from_str(&json)?, doc);
    println!("✓ Lossless round-trip");

    let broken = "name = dx\n[forge\n";
    let result = TransformResult::from(convert(broken, Format::Human, Format::Machine));
    println!("\nDiagnostic for a broken file:");
    println!("{}", serde_json::to_string_pretty(&result)?);

    match machine::from_str(r#"{"version": 7}"#) {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("\nFuture envelope: {}", err),
    }

    Ok(())
}
