//! `[parent.child]` blocks fold into one section.
//!
//! Run with: cargo run --example nested_sections

use dx_format::{human, llm, DxValue};
use std::error::Error;

const PACKAGES: &str = "\
[js]
name = storefront

[js.dependencies]
react = 18.2.0
next = 14
left-pad = 1.3.0

[js.devDependencies]
typescript = 5.4
";

fn main() -> Result<(), Box<dyn Error>> {
    let doc = human::from_str(PACKAGES)?;
    let js = doc.section("j").ok_or("missing js section")?;

    println!("Folded schema:");
    for (key, value) in js.schema().iter().zip(&js.rows()[0]) {
        println!("  {:<28} {}", key, human::format_value(value));
    }

    // Hyphenated package names keep their spelling
    assert_eq!(js.get(0, "left-pad"), Some(&DxValue::from("1.3.0")));
    assert_eq!(js.get(0, "dependencies_react"), Some(&DxValue::from("18.2.0")));

    println!("\nLLM format:\n{}\n", llm::to_string(&doc));
    println!("Flattened Human V3:\n{}", human::to_string(&doc));

    Ok(())
}
