//! Well-known system classes converted without consulting the resolver.
//!
//! Boxed scalars, dates, durations, decimals and GUIDs are written as
//! system class records with fixed member layouts. They become primitive
//! values (or a [`Uuid`]) directly.

use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::deserialize::graph::Value;
use crate::error::DeserializeError;
use crate::model::{
    ClassRecord, DateTime, DateTimeKind, Decimal, MemberValue, PrimitiveType, PrimitiveValue,
    TimeSpan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// A boxed scalar in member `m_value`.
    Boxed(PrimitiveType),
    DateTime,
    TimeSpan,
    Decimal,
    Guid,
}

lazy_static::lazy_static! {
    static ref WELL_KNOWN: FxHashMap<&'static str, Layout> = {
        let mut map = FxHashMap::default();
        for kind in [
            PrimitiveType::Boolean,
            PrimitiveType::Byte,
            PrimitiveType::Char,
            PrimitiveType::Double,
            PrimitiveType::Int16,
            PrimitiveType::Int32,
            PrimitiveType::Int64,
            PrimitiveType::SByte,
            PrimitiveType::Single,
            PrimitiveType::UInt16,
            PrimitiveType::UInt32,
            PrimitiveType::UInt64,
        ] {
            map.insert(kind.system_name(), Layout::Boxed(kind));
        }
        map.insert("System.DateTime", Layout::DateTime);
        map.insert("System.TimeSpan", Layout::TimeSpan);
        map.insert("System.Decimal", Layout::Decimal);
        map.insert("System.Guid", Layout::Guid);
        map
    };
}

const GUID_BYTES: [&str; 8] = ["_d", "_e", "_f", "_g", "_h", "_i", "_j", "_k"];

/// Returns true if a system class of this name is converted directly.
pub fn is_well_known(class_name: &str) -> bool {
    WELL_KNOWN.contains_key(class_name)
}

/// Converts a well-known system class record, or returns None if the class
/// is not one.
pub(crate) fn convert(class: &ClassRecord) -> Option<Result<Value, DeserializeError>> {
    let (&type_name, &layout) = WELL_KNOWN.get_key_value(class.name())?;
    Some(convert_layout(type_name, layout, class))
}

fn convert_layout(
    type_name: &'static str,
    layout: Layout,
    class: &ClassRecord,
) -> Result<Value, DeserializeError> {
    let malformed = |reason: &'static str| DeserializeError::MalformedSystemValue { type_name, reason };
    let member = |name: &str| primitive_member(class, name);

    match layout {
        Layout::Boxed(kind) => match member("m_value") {
            Some(value) if value.kind() == kind => Ok(Value::Primitive(value.clone())),
            _ => Err(malformed("m_value is missing or has the wrong kind")),
        },
        Layout::DateTime => {
            // dateData carries the kind bits; ticks alone is Unspecified.
            let date_time = if let Some(raw) = member("dateData").and_then(PrimitiveValue::as_u64) {
                DateTime::from_raw(raw as i64)
            } else if let Some(ticks) = member("ticks").and_then(PrimitiveValue::as_i64) {
                let ticks = u64::try_from(ticks).map_err(|_| malformed("negative ticks"))?;
                DateTime::new(ticks, DateTimeKind::Unspecified)
            } else {
                return Err(malformed("neither dateData nor ticks is present"));
            };
            date_time
                .map(|dt| Value::Primitive(PrimitiveValue::DateTime(dt)))
                .map_err(|_| malformed("ticks out of range"))
        }
        Layout::TimeSpan => member("_ticks")
            .and_then(PrimitiveValue::as_i64)
            .map(|ticks| Value::Primitive(PrimitiveValue::TimeSpan(TimeSpan(ticks))))
            .ok_or_else(|| malformed("_ticks is missing")),
        Layout::Decimal => {
            let word = |name: &str| {
                member(name)
                    .and_then(PrimitiveValue::as_i32)
                    .ok_or_else(|| malformed("flags, hi, lo and mid must all be Int32"))
            };
            let decimal = Decimal::from_parts(word("lo")?, word("mid")?, word("hi")?, word("flags")?)
                .map_err(|_| malformed("scale or mantissa out of range"))?;
            Ok(Value::Primitive(PrimitiveValue::Decimal(decimal)))
        }
        Layout::Guid => {
            let a = member("_a").and_then(PrimitiveValue::as_i32);
            let b = member("_b").and_then(as_i16);
            let c = member("_c").and_then(as_i16);
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                return Err(malformed("_a, _b or _c is missing"));
            };
            let mut tail = [0u8; 8];
            for (byte, name) in tail.iter_mut().zip(GUID_BYTES) {
                *byte = match member(name) {
                    Some(PrimitiveValue::Byte(v)) => *v,
                    _ => return Err(malformed("_d through _k must be Byte")),
                };
            }
            Ok(Value::Guid(Uuid::from_fields(a as u32, b as u16, c as u16, &tail)))
        }
    }
}

fn primitive_member<'a>(class: &'a ClassRecord, name: &str) -> Option<&'a PrimitiveValue> {
    class.member(name).and_then(MemberValue::as_primitive)
}

fn as_i16(value: &PrimitiveValue) -> Option<i16> {
    match value {
        PrimitiveValue::Int16(v) => Some(*v),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClassBuilder, Id, MemberType};

    fn system_class(name: &str, build: impl FnOnce(ClassBuilder) -> ClassBuilder) -> ClassRecord {
        build(ClassBuilder::new(Id::new(1), name)).build().unwrap()
    }

    #[test]
    fn test_boxed_int() {
        let class = system_class("System.Int32", |c| c.int32("m_value", 42));
        let value = convert(&class).unwrap().unwrap();
        assert_eq!(value.as_i32(), Some(42));
    }

    #[test]
    fn test_boxed_wrong_kind() {
        let class = system_class("System.Int32", |c| c.int64("m_value", 42));
        assert!(matches!(
            convert(&class),
            Some(Err(DeserializeError::MalformedSystemValue {
                type_name: "System.Int32",
                ..
            }))
        ));
    }

    #[test]
    fn test_not_well_known() {
        let class = system_class("System.Version", |c| c.int32("_Major", 1));
        assert!(convert(&class).is_none());
        assert!(!is_well_known("System.Version"));
        assert!(is_well_known("System.Guid"));
    }

    #[test]
    fn test_decimal_parts() {
        let class = system_class("System.Decimal", |c| {
            c.int32("flags", 2 << 16).int32("hi", 0).int32("lo", 12345).int32("mid", 0)
        });
        let value = convert(&class).unwrap().unwrap();
        match value {
            Value::Primitive(PrimitiveValue::Decimal(d)) => assert_eq!(d.as_str(), "123.45"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_date_time_from_date_data() {
        let raw = DateTime::new(630_822_816_000_000_000, DateTimeKind::Utc).unwrap().raw();
        let class = system_class("System.DateTime", |c| {
            c.int64("ticks", 630_822_816_000_000_000)
                .primitive("dateData", PrimitiveValue::UInt64(raw as u64))
        });
        match convert(&class).unwrap().unwrap() {
            Value::Primitive(PrimitiveValue::DateTime(dt)) => {
                assert_eq!(dt.kind(), DateTimeKind::Utc);
                assert_eq!(dt.ticks(), 630_822_816_000_000_000);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_guid() {
        let class = system_class("System.Guid", |mut c| {
            c = c
                .int32("_a", 0x0102_0304)
                .primitive("_b", PrimitiveValue::Int16(0x0506))
                .primitive("_c", PrimitiveValue::Int16(0x0708));
            for (i, name) in GUID_BYTES.iter().enumerate() {
                c = c.primitive(*name, PrimitiveValue::Byte(9 + i as u8));
            }
            c
        });
        let guid = convert(&class).unwrap().unwrap().as_guid().unwrap();
        assert_eq!(guid.to_string(), "01020304-0506-0708-090a-0b0c0d0e0f10");
    }

    #[test]
    fn test_guid_member_must_be_primitive() {
        let class = system_class("System.Guid", |c| c.null("_a", MemberType::Object));
        assert!(matches!(
            convert(&class),
            Some(Err(DeserializeError::MalformedSystemValue { .. }))
        ));
    }
}
