//! Reading, writing and narrowing Sigma values.
//!
//! Run with: cargo run --example simple

use sigma::{
    from_str, to_string, to_string_with_options, value, Bytes, Temporal, Value, WriteOptions,
};
use std::collections::BTreeMap;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Parse a document into the dynamic model
    let doc: Value = from_str(
        r#"{ "name" = "sensor-7", "readings" = [1.25, -0.5, 3e2], "since" = @2019-01-01,
             "active" = &t, "raw" = *AQID }"#,
    )?;
    println!("Read back as:\n{}\n", to_string(&doc)?);

    // Narrow a part of it into Rust types
    let map = doc.as_map().ok_or("expected a map")?;
    let field = |name: &str| map.get(&Value::from(name)).cloned().unwrap_or_default();
    let readings: Vec<f64> = sigma::from_value(field("readings"))?;
    println!("Readings: {:?}", readings);

    let since: Temporal = sigma::from_value(field("since"))?;
    println!("Since: {} ({})", since, since.kind());

    // Narrowing never rounds
    match from_str::<Vec<i32>>("[1, 2.5]") {
        Ok(v) => println!("unexpected: {:?}", v),
        Err(e) => println!("Narrowing [1, 2.5] to Vec<i32> fails: {}\n", e),
    }

    // Build values with the macro
    let built = value!({ "id" => 7, "tags" => ["a", "b"], 9 => null });
    println!("Built with value!: {}", to_string(&built)?);

    // Typed maps come back sorted or ordered depending on the target
    let scores: BTreeMap<String, i64> = from_str(r#"{"b"=2, "a"=1}"#)?;
    println!("Sorted scores: {:?}", scores);

    // Binary blobs: raw by default, base64 on request
    let blob = Bytes::from(&b"The quick brown fox"[..]);
    println!("Raw:    {}", to_string(&blob)?);
    println!("Base64: {}", to_string_with_options(&blob, WriteOptions::base64())?);

    Ok(())
}
