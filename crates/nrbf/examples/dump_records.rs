//! Simple decoder to inspect NRBF streams.

use std::fs;

use nrbf::model::{ArrayItems, ArrayKind};
use nrbf::{validate_message, DecodeOptions, MemberType, MemberValue, Message, Record};

fn format_type(ty: &MemberType) -> String {
    match ty {
        MemberType::Primitive(p) => format!("{:?}", p),
        MemberType::String => "String".to_string(),
        MemberType::Object => "Object".to_string(),
        MemberType::SystemClass(name) => name.clone(),
        MemberType::Class(info) => format!("{} (lib {})", info.type_name, info.library_id),
        MemberType::ObjectArray => "Object[]".to_string(),
        MemberType::StringArray => "String[]".to_string(),
        MemberType::PrimitiveArray(p) => format!("{:?}[]", p),
    }
}

/// Shortens text to 80 characters.
fn preview(text: &str) -> String {
    let preview: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        format!("{}...", preview)
    } else {
        preview
    }
}

fn format_value(v: &MemberValue) -> String {
    match v {
        MemberValue::Null => "null".to_string(),
        MemberValue::Primitive(p) => preview(&format!("{:?}", p)),
        MemberValue::Reference(id) => format!("-> {}", id),
        MemberValue::Record(record) => match record.as_ref() {
            Record::String(s) => format!("#{} \"{}\"", s.object_id, s.value),
            other => format!("#{} inline {}", other.id(), other.describe()),
        },
    }
}

fn print_record(record: &Record) {
    match record {
        Record::Class(class) => {
            println!("#{} {:?} {}", class.id(), class.record_type(), class.name());
            if let Some(lib) = class.library_id() {
                println!("      library: {}", lib);
            }
            let types = class.member_types();
            for (i, (name, value)) in class.member_names().iter().zip(class.values()).enumerate() {
                match types.get(i) {
                    Some(ty) => println!("      {}: {} = {}", name, format_type(ty), format_value(value)),
                    None => println!("      {} = {}", name, format_value(value)),
                }
            }
        }
        Record::Array(array) => {
            let shape = match array.kind() {
                ArrayKind::Binary(shape) => format!("{:?} {:?}", shape.array_type, shape.lengths),
                other => format!("{:?}", other),
            };
            println!("#{} {:?} {} [{}]", array.id(), array.record_type(), shape, array.length());
            match array.items() {
                ArrayItems::Primitive(values) => {
                    for (i, v) in values.iter().take(10).enumerate() {
                        println!("      [{}] {:?}", i, v);
                    }
                }
                ArrayItems::Values(values) => {
                    for (i, v) in values.iter().take(10).enumerate() {
                        println!("      [{}] {}", i, format_value(v));
                    }
                }
            }
            if array.length() > 10 {
                println!("      ... and {} more items", array.length() - 10);
            }
        }
        Record::String(s) => println!("#{} String \"{}\"", s.object_id, s.value),
        Record::Library(lib) => println!("#{} Library {}", lib.library_id, lib.name),
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/sample.nrbf".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let message = Message::decode(&data, &DecodeOptions::default()).expect("Failed to decode");

    let header = message.header();
    println!("\n=== Header ===");
    println!("Root: {}", header.root_id);
    println!("Version: {}.{}", header.major_version, header.minor_version);

    match validate_message(&message) {
        Ok(()) => println!("References: ok"),
        Err(e) => println!("References: {}", e),
    }

    println!("\n=== Records ({}) ===", message.records().len());
    for record in message.records() {
        print_record(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_counts_chars() {
        let wide = "é".repeat(80);
        assert_eq!(preview(&wide), wide);
        assert_eq!(preview(&"é".repeat(81)), format!("{}...", wide));
    }
}
