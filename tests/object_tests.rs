use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sigma::{
    from_str, register, to_string, unregister_all, value, Bytes, Map, OffsetTime, Reader,
    TypeRegistry, Value, Writer, ZonedDateTime,
};
use std::collections::BTreeMap;
use std::error::Error as _;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TestModel {
    b: u8,
    bl: bool,
    bytes: Bytes,
    i: i32,
    l: i64,
    #[serde(with = "sigma::with::temporal")]
    ld: NaiveDate,
    #[serde(with = "sigma::with::temporal")]
    ldt: NaiveDateTime,
    list: Vec<Value>,
    #[serde(with = "sigma::with::temporal")]
    local_time: NaiveTime,
    map: Map,
    offset_time: OffsetTime,
    s: i16,
    str: String,
    tree: BTreeMap<i32, i32>,
    zdt: ZonedDateTime,
}

impl Default for TestModel {
    fn default() -> Self {
        let mut map = Map::new();
        map.insert(Value::from("xyx"), Value::from(99));
        map.insert(Value::from(9), Value::from(9));

        let mut tree = BTreeMap::new();
        tree.insert(3, 9);
        tree.insert(2, 4);

        let hobart_summer = FixedOffset::east_opt(11 * 3600).unwrap();
        TestModel {
            b: 53,
            bl: true,
            bytes: Bytes::from(&b"abcdef"[..]),
            i: 54,
            l: 55,
            ld: NaiveDate::from_ymd_opt(2019, 3, 21).unwrap(),
            ldt: NaiveDate::from_ymd_opt(2019, 8, 22)
                .unwrap()
                .and_hms_milli_opt(10, 11, 12, 123)
                .unwrap(),
            list: vec![Value::from("abc")],
            local_time: NaiveTime::from_hms_opt(10, 11, 12).unwrap(),
            map,
            offset_time: OffsetTime::new(
                NaiveTime::from_hms_opt(10, 11, 12).unwrap(),
                FixedOffset::east_opt(11 * 3600 + 20 * 60).unwrap(),
            ),
            s: 56,
            str: "string".to_string(),
            tree,
            zdt: ZonedDateTime::new(
                NaiveDate::from_ymd_opt(2020, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                hobart_summer,
                chrono_tz::Australia::Hobart,
            )
            .unwrap(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Segment {
    start: Point,
    end: Option<Point>,
    tags: Vec<String>,
}

const DEFAULT_MODEL: &str = concat!(
    "model{b=53,bl=&t,bytes=|6|abcdef,i=54,l=55,ld=@2019-03-21,",
    "ldt=@2019-08-22T10:11:12.123,list=[\"abc\"],local_time=@10:11:12,",
    "map={\"xyx\"=99,9=9},offset_time=@10:11:12+11:20,s=56,str=\"string\",",
    "tree={2=4,3=9},zdt=@2020-01-01T00:00:00+11:00[Australia/Hobart]}"
);

fn registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    registry.register::<TestModel>("model").unwrap();
    registry.register::<Point>("point").unwrap();
    registry.register::<Segment>("segment").unwrap();
    registry
}

fn read_with(registry: &TypeRegistry, input: &str) -> sigma::Result<Value> {
    Reader::new(input.as_bytes()).with_registry(registry).read()
}

fn write_with(registry: &TypeRegistry, value: &Value) -> String {
    let mut writer = Writer::new(Vec::new()).with_registry(registry);
    writer.write(value).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

fn model_of(value: &Value) -> TestModel {
    sigma::from_value(value.clone()).unwrap()
}

#[test]
fn test_write_default_model() {
    let registry = registry();
    let value = sigma::to_value(&TestModel::default()).unwrap();
    assert_eq!(write_with(&registry, &value), DEFAULT_MODEL);
}

#[test]
fn test_read_default_model() {
    let registry = registry();
    let value = read_with(&registry, DEFAULT_MODEL).unwrap();
    assert_eq!(model_of(&value), TestModel::default());
}

#[test]
fn test_missing_fields_keep_defaults() {
    let registry = registry();
    let value = read_with(&registry, "model{ i = 1 , str = \"other\" }").unwrap();
    let model = model_of(&value);
    assert_eq!(model.i, 1);
    assert_eq!(model.str, "other");
    assert_eq!(model.l, 55);
    assert_eq!(model.tree.len(), 2);

    let empty = read_with(&registry, "model{}").unwrap();
    assert_eq!(model_of(&empty), TestModel::default());
}

#[test]
fn test_field_coercion() {
    let registry = registry();
    let value = read_with(&registry, "model{b=200, s=-3, tree={1=1}, bytes=[1,2]}").unwrap();
    let model = model_of(&value);
    assert_eq!(model.b, 200);
    assert_eq!(model.s, -3);
    assert_eq!(model.tree.get(&1), Some(&1));
    assert_eq!(&*model.bytes, &[1u8, 2][..]);
}

#[test]
fn test_unregistered_identifier() {
    let registry = registry();
    let err = read_with(&registry, "nobody{a=1}").unwrap_err();
    assert!(err.to_string().contains("type 'nobody' is not registered"));
}

#[test]
fn test_unknown_property() {
    let registry = registry();
    let err = read_with(&registry, "model{zz=1}").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("unable to create instance of type 'model'"));
    assert!(text.contains("unable to find property TestModel.zz"));
}

#[test]
fn test_rejected_property() {
    let registry = registry();
    let err = read_with(&registry, "model{i=\"x\"}").unwrap_err();
    assert!(err.to_string().contains("unable to create instance"));
    assert!(err.to_string().contains("unable to set property TestModel.i"));

    let inner = err.source().unwrap();
    assert!(inner.to_string().contains("unable to set property"));
    let root = inner.source().unwrap();
    assert!(root.to_string().contains("unable to coerce"));

    let err = read_with(&registry, "model{b=256}").unwrap_err();
    assert!(err.to_string().contains("unable to set property TestModel.b"));
}

#[test]
fn test_malformed_object_body() {
    let registry = registry();
    let err = read_with(&registry, "point{x 1}").unwrap_err();
    assert!(err.to_string().contains("'=' expected"));
    let err = read_with(&registry, "point{x=1").unwrap_err();
    assert!(err.to_string().contains("unable to create instance"));
}

#[test]
fn test_nested_objects() {
    let registry = registry();
    let input = r#"segment{start=point{x=1,y=2},end=&n,tags=["a","b"]}"#;
    let value = read_with(&registry, input).unwrap();
    let segment: Segment = sigma::from_value(value.clone()).unwrap();
    assert_eq!(segment.start, Point { x: 1, y: 2 });
    assert_eq!(segment.end, None);
    assert_eq!(segment.tags, vec!["a", "b"]);
    assert_eq!(write_with(&registry, &value), input);

    let err = read_with(&registry, "segment{start=model{}}").unwrap_err();
    assert!(err.to_string().contains("unable to set property Segment.start"));
}

#[test]
fn test_objects_inside_collections() {
    let registry = registry();
    let input = "[point{x=1,y=1},{point{x=2,y=2}=&t}]";
    let value = read_with(&registry, input).unwrap();
    assert_eq!(write_with(&registry, &value), input);

    let points: Vec<Value> = sigma::from_value(value).unwrap();
    let first: Point = sigma::from_value(points[0].clone()).unwrap();
    assert_eq!(first, Point { x: 1, y: 1 });
}

#[test]
fn test_wrong_record_type() {
    let value = sigma::to_value(&Point { x: 1, y: 2 }).unwrap();
    let err = sigma::from_value::<Segment>(value).unwrap_err();
    assert!(err.to_string().contains("unable to coerce"));
}

#[test]
fn test_reregistration_replaces_identifier() {
    let registry = registry();
    registry.register::<Point>("pt").unwrap();
    assert!(registry.lookup_type("point").is_none());
    assert_eq!(registry.lookup_identifier("Point").as_deref(), Some("pt"));

    let value = sigma::to_value(&Point { x: 3, y: 4 }).unwrap();
    assert_eq!(write_with(&registry, &value), "pt{x=3,y=4}");
}

#[test]
fn test_global_registry() {
    register::<Point>("gpoint").unwrap();
    let point: Point = from_str("gpoint{x=5}").unwrap();
    assert_eq!(point, Point { x: 5, y: 0 });
    assert_eq!(to_string(&point).unwrap(), "gpoint{x=5,y=0}");

    unregister_all();
    let err = from_str::<Point>("gpoint{x=5}").unwrap_err();
    assert!(err.to_string().contains("is not registered"));
    assert!(to_string(&point)
        .unwrap_err()
        .to_string()
        .contains("No object type registered for class Point"));
}

#[test]
fn test_object_json_export() {
    let value = value!([1, "a"]);
    assert_eq!(serde_json::to_string(&value).unwrap(), r#"["1","a"]"#);

    let point = sigma::to_value(&Point { x: 1, y: 2 }).unwrap();
    let json = serde_json::to_value(&point).unwrap();
    assert_eq!(json, serde_json::json!({ "Point": { "x": "1", "y": "2" } }));
}

#[test]
fn test_renamed_struct_uses_serde_name() {
    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename = "Pin")]
    struct Marker {
        #[serde(rename = "at")]
        position: i32,
    }

    let registry = TypeRegistry::new();
    registry.register::<Marker>("pin").unwrap();
    assert_eq!(registry.lookup_identifier("Pin").as_deref(), Some("pin"));

    let value = read_with(&registry, "pin{at=4}").unwrap();
    assert_eq!(write_with(&registry, &value), "pin{at=4}");
    let marker: Marker = sigma::from_value(value).unwrap();
    assert_eq!(marker, Marker { position: 4 });
}

#[test]
fn test_value_fields_keep_objects() {
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Envelope {
        payload: Value,
    }

    let registry = registry();
    registry.register::<Envelope>("envelope").unwrap();
    let input = "envelope{payload=point{x=1,y=2}}";
    let value = read_with(&registry, input).unwrap();
    let envelope: Envelope = sigma::from_value(value.clone()).unwrap();
    let point: Point = sigma::from_value(envelope.payload).unwrap();
    assert_eq!(point, Point { x: 1, y: 2 });
    assert_eq!(write_with(&registry, &value), input);
}
