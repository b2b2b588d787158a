use serde::{Deserialize, Serialize};
use sigma::{from_value, to_string, value, Map, TypeRegistry, Value, Writer};

#[test]
fn test_value_macro_constants() {
    assert_eq!(value!(null), Value::Null);
    assert_eq!(value!(true), Value::Bool(true));
    assert_eq!(value!(false), Value::Bool(false));
}

#[test]
fn test_value_macro_scalars() {
    assert_eq!(value!(42), Value::from(42));
    assert_eq!(value!(-7i64), Value::from(-7i64));
    assert_eq!(value!("hi"), Value::from("hi"));

    let name = String::from("dynamic");
    assert_eq!(value!(name), Value::from("dynamic"));
}

#[test]
fn test_value_macro_nested() {
    let v = value!({
        "name" => "Alice",
        "tags" => ["rust", "sigma"],
        1 => { [1, 2] => null }
    });
    assert_eq!(
        to_string(&v).unwrap(),
        r#"{"name"="Alice","tags"=["rust","sigma"],1={[1,2]=&n}}"#
    );
}

#[test]
fn test_value_macro_empty() {
    assert_eq!(value!([]), Value::List(Vec::new()));
    assert_eq!(value!({}), Value::Map(Map::new()));
    assert_eq!(to_string(&value!([[], {}])).unwrap(), "[[],{}]");
}

#[test]
fn test_value_macro_trailing_commas() {
    assert_eq!(value!([1, 2,]), value!([1, 2]));
    assert_eq!(value!({ "a" => 1, }), value!({ "a" => 1 }));
}

#[test]
fn test_value_macro_non_finite_becomes_null() {
    assert_eq!(value!(f64::NAN), Value::Null);
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Account {
    id: i64,
    owner: String,
    #[serde(with = "sigma::with::decimal")]
    balance: rust_decimal::Decimal,
    closed: bool,
}

#[test]
fn test_value_macro_with_struct() {
    let account = Account {
        id: 2,
        ..Account::default()
    };
    let v = value!([account]);
    let object = v.as_list().unwrap()[0].as_object().unwrap();
    assert_eq!(object.name(), "Account");
    let names: Vec<_> = object.fields().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["id", "owner", "balance", "closed"]);
}

#[test]
fn test_derived_record_write() {
    let registry = TypeRegistry::new();
    registry.register::<Account>("account").unwrap();

    let account = Account {
        id: 7,
        owner: "ann".to_string(),
        balance: rust_decimal::Decimal::new(1050, 2),
        closed: false,
    };
    let mut writer = Writer::new(Vec::new()).with_registry(&registry);
    writer.write_as(&account).unwrap();
    assert_eq!(
        writer.into_inner(),
        br#"account{id=7,owner="ann",balance=10.50,closed=&f}"#
    );
}

#[test]
fn test_derived_record_from_value() {
    let account = Account {
        id: 1,
        ..Account::default()
    };
    let value = sigma::to_value(&account).unwrap();
    assert!(value.is_object());
    assert_eq!(from_value::<Account>(value).unwrap(), account);

    let err = from_value::<Account>(value!([1])).unwrap_err();
    assert!(err.to_string().contains("unable to coerce list"));
}
