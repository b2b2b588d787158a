//! Binding named objects to Rust structs.
//!
//! Run with: cargo run --example named_objects

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sigma::{from_str, register, to_string, Reader, TypeRegistry, Value, Writer};
use std::error::Error;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Survey {
    title: String,
    // chrono types go through the temporal adapter
    #[serde(with = "sigma::with::temporal::option")]
    taken: Option<NaiveDate>,
    #[serde(with = "sigma::with::decimal")]
    depth: Decimal,
    points: Vec<Point>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // The crate-level functions use the global registry
    register::<Point>("point")?;
    register::<Survey>("survey")?;

    let survey = Survey {
        title: "north field".to_string(),
        taken: NaiveDate::from_ymd_opt(2019, 3, 21),
        depth: Decimal::new(-123, 2),
        points: vec![Point { x: 1, y: 2 }, Point { x: 3, y: 5 }],
    };

    let text = to_string(&survey)?;
    println!("Sigma output:\n{}\n", text);

    let back: Survey = from_str(&text)?;
    assert_eq!(survey, back);
    println!("✓ Round-trip successful");

    // Omitted fields keep their defaults
    let partial: Survey = from_str(r#"survey{ title = "draft" }"#)?;
    println!("Partial: {:?}\n", partial);

    // Errors name the type and field at fault
    if let Err(e) = from_str::<Survey>(r#"survey{ title = 7 }"#) {
        println!("Bad field: {}", e);
    }
    if let Err(e) = from_str::<Survey>(r#"survey{ weather = 7 }"#) {
        println!("Unknown field: {}", e);
    }
    if let Err(e) = from_str::<Survey>(r#"survey{ taken = @10:00:00 }"#) {
        println!("Wrong temporal flavor: {}\n", e);
    }

    // A private registry keeps identifiers scoped to one reader or writer
    let registry = TypeRegistry::new();
    registry.register::<Point>("p")?;

    let mut writer = Writer::new(Vec::new()).with_registry(&registry);
    writer.write_as(&Point { x: 9, y: 9 })?;
    let bytes = writer.into_inner();
    println!("Private registry output: {}", String::from_utf8(bytes.clone())?);

    let value: Value = Reader::new(bytes.as_slice()).with_registry(&registry).read()?;
    let point: Point = sigma::from_value(value)?;
    println!("Read back: {:?}", point);

    // Any serde format can receive a parsed value
    let json = serde_json::to_string(&sigma::to_value(&survey)?)?;
    println!("As JSON: {}", json);

    Ok(())
}
