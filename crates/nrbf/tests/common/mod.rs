//! Hand-assembled wire fixtures shared by the integration tests.

#![allow(dead_code)]

use nrbf::RecordType;

/// Little byte builder for NRBF streams.
#[derive(Debug, Clone, Default)]
pub struct Wire(Vec<u8>);

impl Wire {
    /// Starts a stream with a version 1.0 header naming `root`.
    pub fn header(root: i32) -> Self {
        Wire::default()
            .tag(RecordType::SerializedStreamHeader)
            .i32(root)
            .i32(-1)
            .i32(1)
            .i32(0)
    }

    pub fn tag(self, record: RecordType) -> Self {
        self.byte(record as u8)
    }

    pub fn byte(mut self, b: u8) -> Self {
        self.0.push(b);
        self
    }

    pub fn bytes(mut self, b: &[u8]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Writes a string with a one-byte length prefix.
    pub fn str(self, s: &str) -> Self {
        assert!(s.len() < 0x80);
        self.byte(s.len() as u8).bytes(s.as_bytes())
    }

    /// Writes a BinaryObjectString record.
    pub fn string_record(self, id: i32, s: &str) -> Self {
        self.tag(RecordType::BinaryObjectString).i32(id).str(s)
    }

    /// Appends MessageEnd and returns the bytes.
    pub fn end(self) -> Vec<u8> {
        self.tag(RecordType::MessageEnd).0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// `class "Pair" { Int32 X = 1; Int32 Y = 2; }` as the root.
pub fn pair() -> Vec<u8> {
    Wire::header(1)
        .tag(RecordType::SystemClassWithMembersAndTypes)
        .i32(1)
        .str("Pair")
        .i32(2)
        .str("X")
        .str("Y")
        .bytes(&[0, 0])
        .bytes(&[8, 8])
        .i32(1)
        .i32(2)
        .end()
}

pub const SHAPES: &str = "Shapes, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null";

/// A `Shapes.Line` whose two `Shapes.Point` members are written inline, the
/// second one through ClassWithId.
pub fn line() -> Vec<u8> {
    Wire::header(1)
        .tag(RecordType::BinaryLibrary)
        .i32(2)
        .str(SHAPES)
        .tag(RecordType::ClassWithMembersAndTypes)
        .i32(1)
        .str("Shapes.Line")
        .i32(2)
        .str("Start")
        .str("End")
        .bytes(&[4, 4])
        .str("Shapes.Point")
        .i32(2)
        .str("Shapes.Point")
        .i32(2)
        .i32(2)
        // Start
        .tag(RecordType::ClassWithMembersAndTypes)
        .i32(3)
        .str("Shapes.Point")
        .i32(2)
        .str("X")
        .str("Y")
        .bytes(&[0, 0])
        .bytes(&[8, 8])
        .i32(2)
        .i32(1)
        .i32(2)
        // End
        .tag(RecordType::ClassWithId)
        .i32(4)
        .i32(3)
        .i32(3)
        .i32(4)
        .end()
}
