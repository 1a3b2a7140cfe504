use crate::serializable::{AnySerializable, Monitored, short_type_name};

use serde::Serialize;
use serde_json::json;

#[derive(Clone, Serialize)]
struct Rename {
    to: String,
}

struct Opaque;

impl Monitored for Opaque {
    fn snapshot(&self) -> Option<AnySerializable> {
        None
    }
}

#[test]
fn given_wrapped_value_when_serialized_then_forwards_unchanged() {
    let boxed = AnySerializable::new(Rename {
        to: "Jenny".to_string(),
    });

    assert_eq!(boxed.to_wire().expect("wire"), json!({"to": "Jenny"}));
    assert_eq!(
        serde_json::to_string(&boxed).expect("serialize"),
        r#"{"to":"Jenny"}"#
    );
}

#[test]
fn given_wrapped_value_when_type_name_read_then_is_bare_type_name() {
    let boxed = AnySerializable::new(Rename { to: String::new() });

    assert_eq!(boxed.type_name(), "Rename");
    assert_eq!(format!("{boxed:?}"), "AnySerializable(\"Rename\")");
}

#[test]
fn given_clone_when_serialized_then_shares_value() {
    let boxed = AnySerializable::new(vec![1, 2, 3]);
    let cloned = boxed.clone();

    assert_eq!(cloned.to_wire().expect("wire"), json!([1, 2, 3]));
}

#[test]
fn given_monitored_default_when_type_name_read_then_uses_concrete_type() {
    let value: &dyn Monitored = &Opaque;

    assert_eq!(value.type_name(), "Opaque");
}

#[test]
fn given_type_paths_when_shortened_then_keeps_last_segment() {
    assert_eq!(short_type_name("demo::store::SetName"), "SetName");
    assert_eq!(short_type_name("u32"), "u32");
}

/// **VALUE**: Verifies that composite type names keep their shape.
///
/// **BUG THIS CATCHES**: Would catch cutting at the last `::` of the whole string,
/// which turns `[demo::SetName; 2]` into `SetName; 2]`.
#[test]
fn given_composite_type_paths_when_shortened_then_each_path_shortened_in_place() {
    assert_eq!(short_type_name("alloc::vec::Vec<u8>"), "Vec<u8>");
    assert_eq!(short_type_name("[demo::store::SetName; 2]"), "[SetName; 2]");
    assert_eq!(short_type_name("(u8, demo::store::SetName)"), "(u8, SetName)");
    assert_eq!(
        short_type_name("core::option::Option<alloc::vec::Vec<demo::SetName>>"),
        "Option<Vec<SetName>>"
    );
    assert_eq!(short_type_name("&str"), "&str");
}

#[test]
fn given_vec_value_when_boxed_then_type_name_keeps_generic_argument() {
    let boxed = AnySerializable::new(vec![Rename { to: String::new() }]);

    assert_eq!(boxed.type_name(), "Vec<Rename>");
}
