//! Integration tests for reflected enums
//!
//! Tests cover:
//! - Native enums published in the environment
//! - Flag enums combined with bitwise operators
//! - Enum iteration and dumps
//! - The built-in reflection enums

use gany_core::{registry, Any, Caster, Kind, MetaFunction};
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestEnum {
    A,
    B,
    C,
    D,
    E,
}

impl TestEnum {
    const ALL: [TestEnum; 5] = [TestEnum::A, TestEnum::B, TestEnum::C, TestEnum::D, TestEnum::E];
}

impl Caster for TestEnum {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TestFlag(u8);

impl TestFlag {
    const A: TestFlag = TestFlag(0x01);
    const B: TestFlag = TestFlag(0x02);
    const C: TestFlag = TestFlag(0x04);
    const AB: TestFlag = TestFlag(0x03);

    const NAMED: [(&'static str, TestFlag); 4] = [
        ("A", TestFlag::A),
        ("B", TestFlag::B),
        ("C", TestFlag::C),
        ("AB", TestFlag::AB),
    ];

    fn name(self) -> String {
        TestFlag::NAMED
            .iter()
            .find(|(_, f)| *f == self)
            .map(|(n, _)| n.to_string())
            .unwrap_or_else(|| format!("{:#04x}", self.0))
    }
}

impl Caster for TestFlag {}

static REGISTER: Once = Once::new();

fn register_enums() {
    REGISTER.call_once(|| {
        let reg = registry();
        let values = Any::object_from(TestEnum::ALL.iter().map(|e| (format!("{e:?}"), Any::new(*e))));
        reg.class::<TestEnum>("E", "TestEnum", "TestEnum.")
            .def_enum("Enum", values, "")
            .func(MetaFunction::ToString, |e: TestEnum| format!("{e:?}"), "")
            .func(MetaFunction::EqualTo, |a: TestEnum, b: TestEnum| a == b, "")
            .func(MetaFunction::ToInt32, |e: TestEnum| e as i32, "")
            .build()
            .unwrap();

        let flags = Any::object_from(TestFlag::NAMED.iter().map(|(n, f)| (*n, Any::new(*f))));
        reg.class::<TestFlag>("E", "TestFlag", "TestFlag.")
            .def_enum("Enum", flags, "")
            .func(MetaFunction::ToString, |f: TestFlag| f.name(), "")
            .func(MetaFunction::EqualTo, |a: TestFlag, b: TestFlag| a == b, "")
            .func(MetaFunction::BitOr, |a: TestFlag, b: TestFlag| TestFlag(a.0 | b.0), "")
            .func(MetaFunction::BitAnd, |a: TestFlag, b: TestFlag| TestFlag(a.0 & b.0), "")
            .func(MetaFunction::ToInt32, |f: TestFlag| f.0 as i32, "")
            .build()
            .unwrap();
    });
}

// ============================================================================
// Native enums
// ============================================================================

#[test]
fn test_reflected_enum() {
    register_enums();
    let env = registry().environment();
    assert!(env.get("E").contains("TestEnum"));

    let any_enum = env.get("E.TestEnum");
    for e in TestEnum::ALL {
        let v = any_enum.get(format!("{e:?}"));
        assert_eq!(v.downcast::<TestEnum>().unwrap(), e);
        assert_eq!(v, Any::new(e));
    }
    assert_eq!(any_enum.get("C").to_int32().unwrap(), 2);
    assert_eq!(any_enum.get("D").try_to_string().unwrap(), "D");
}

#[test]
fn test_flag_enum_operators() {
    register_enums();
    let flags = registry().environment().get("E.TestFlag");
    let ab = flags.get("A").bit_or(&flags.get("B")).unwrap();
    assert_eq!(ab.downcast::<TestFlag>().unwrap(), TestFlag::AB);
    assert_eq!(ab, flags.get("AB"));
    assert_eq!(ab.try_to_string().unwrap(), "AB");

    let none = flags.get("A").bit_and(&flags.get("C")).unwrap();
    assert_eq!(none.to_int32().unwrap(), 0);
    assert_eq!(none.try_to_string().unwrap(), "0x00");
}

#[test]
fn test_enum_iteration_and_dump() {
    register_enums();
    let descriptor = registry().environment().get("E.TestFlag.Enum");
    assert!(descriptor.is_enum());

    let mut names = Vec::new();
    let it = descriptor.iterator().unwrap();
    while it.has_next().unwrap() {
        names.push(it.next().unwrap().first.try_to_string().unwrap());
    }
    assert_eq!(names, ["A", "AB", "B", "C"]);

    // enum iterators are read-only
    let it = descriptor.iterator().unwrap();
    it.next().unwrap();
    it.call("remove", &[]).unwrap();
    assert_eq!(descriptor.to_object().unwrap().size(), 4);

    let dump = registry()
        .environment()
        .get("E.TestFlag")
        .call("dump", &[])
        .unwrap();
    let listed = dump.get("enums").get(0).get("enum");
    let keys: Vec<String> = listed
        .array_items()
        .iter()
        .map(|item| item.get("key").try_to_string().unwrap())
        .collect();
    assert_eq!(keys, ["A", "B", "AB", "C"]);
}

// ============================================================================
// Built-in reflection enums
// ============================================================================

#[test]
fn test_any_type_enum() {
    let any_type = registry().environment().get("AnyType");
    let double_t = any_type.get("Enum.double_t");
    assert_eq!(double_t.downcast::<Kind>().unwrap(), Kind::Float64);
    assert_eq!(Any::from(1.5).kind() as i32, double_t.to_int32().unwrap());
}

#[test]
fn test_meta_function_enum() {
    let meta = registry().environment().get("MetaFunction");
    let to_string = meta.get("ToString");
    assert_eq!(to_string.downcast::<MetaFunction>().unwrap(), MetaFunction::ToString);
    assert_eq!(to_string.call("name", &[]).unwrap().try_to_string().unwrap(), "__str");
}
