//! Column bindings of a record type.

use serde::de::{self, DeserializeOwned, Visitor};

use super::CodecError;
use crate::cell::{Cell, Row};
use quire_common::{QuireError, Result};

/// Ordered column names a record type binds to.
///
/// Derived from the type's `Deserialize` impl on every call: field names
/// (after `#[serde(rename)]`) in declaration order, without
/// `#[serde(skip)]` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordShape {
    columns: Vec<&'static str>,
}

impl RecordShape {
    /// Derives the shape of `T`. Fails with a shape error if `T` is not a struct.
    pub fn of<T: DeserializeOwned>() -> Result<Self> {
        let mut fields = None;
        // Discovery always errors out; all it leaves behind is the field list.
        let _ = T::deserialize(ShapeProbe {
            fields: &mut fields,
        });
        fields
            .map(|columns: &'static [&'static str]| Self {
                columns: columns.to_vec(),
            })
            .ok_or_else(|| QuireError::Shape("record must be a struct".to_string()))
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column within the record's encoded row.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    /// The header row a table holding these records should carry.
    pub fn header_row(&self) -> Row {
        self.columns.iter().map(|c| Cell::text(*c)).collect()
    }
}

struct ShapeProbe<'a> {
    fields: &'a mut Option<&'static [&'static str]>,
}

impl<'de, 'a> de::Deserializer<'de> for ShapeProbe<'a> {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> std::result::Result<V::Value, CodecError> {
        Err(CodecError::shape("record must be a struct"))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, CodecError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> std::result::Result<V::Value, CodecError> {
        *self.fields = Some(fields);
        Err(CodecError::shape("field discovery"))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct seq tuple tuple_struct map enum
        identifier ignored_any
    }
}
