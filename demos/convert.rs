//! One document in all three formats.
//!
//! Run with: cargo run --example convert

use dx_format::convert::{convert, Format};
use dx_format::{human, llm, machine};
use std::error::Error;

const PROJECT: &str = "\
name = dx
version = 0.0.1

[stack]
js = javascript | bun | tsc

[forge]
repository = https://example.com
container = none

[driven] = id | name | active
alpha = \"Alpha Shop\" | true
beta = Beta | false
";

fn main() -> Result<(), Box<dyn Error>> {
    let doc = human::from_str(PROJECT)?;

    let dense = llm::to_string(&doc);
    println!("LLM format:\n{}\n", dense);

    let json = machine::to_string_pretty(&doc)?;
    println!("Machine envelope:\n{}\n", json);

    // Every codec reads back the same document
    assert_eq!(llm::from_str(&dense)?, doc);
    assert_eq!(machine::from_str(&json)?, doc);
    assert_eq!(human::from_str(&human::to_string(&doc))?, doc);
    println!("✓ Round-trip successful");

    let editable = convert(&dense, Format::Llm, Format::Human)?;
    println!("\nBack to Human V3:\n{}", editable);

    println!("=== Size Comparison ===");
    println!("Human:   {} bytes", PROJECT.len());
    println!("LLM:     {} bytes", dense.len());
    println!("Machine: {} bytes", machine::to_string(&doc)?.len());

    Ok(())
}
