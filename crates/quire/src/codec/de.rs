//! Row -> record deserialization.
//!
//! Columns are looked up by name in the header row. Every scalar target is
//! parsed from the cell's canonical text; a value that does not parse leaves
//! the field at its zero value instead of failing. Sequences, maps and nested
//! structs go through JSON, with the same zero-value fallback.
//!
//! Targets without a zero value (enums, the inner value of an `Option`)
//! report [`CodecError::Uncoercible`]. [`decode_record`] then decodes the
//! record again with that field treated as absent, and if that still fails,
//! with the field left out so serde applies `#[serde(default)]`.

use serde::de::value::{StrDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::borrow::Cow;
use tracing::trace;

use super::{column_index, CodecError};
use crate::cell::Cell;

/// Fallback chosen for a field after a coercion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    /// Fill the field as if its column were missing
    Absent,
    /// Leave the key out so `#[serde(default)]` or `None` applies
    Omitted,
}

type Fallbacks = [(&'static str, Fallback)];

fn fallback_for(fallbacks: &Fallbacks, field: &str) -> Option<Fallback> {
    fallbacks
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, fallback)| *fallback)
}

/// Decodes one record, escalating the fallback of each field that does not
/// coerce until the record decodes or a field has nothing left to fall back on.
pub(crate) fn decode_record<T: DeserializeOwned>(
    row: &[Cell],
    header: &[Cell],
) -> Result<T, CodecError> {
    let mut fallbacks: Vec<(&'static str, Fallback)> = Vec::new();
    loop {
        let attempt = T::deserialize(RecordDeserializer {
            row,
            header,
            fallbacks: &fallbacks,
        });
        let (field, message) = match attempt {
            Err(CodecError::Field { field, message }) => (field, message),
            other => return other,
        };

        let next = match fallback_for(&fallbacks, field) {
            None => Fallback::Absent,
            Some(Fallback::Absent) => Fallback::Omitted,
            Some(Fallback::Omitted) => return Err(CodecError::Field { field, message }),
        };
        trace!(field, %message, ?next, "field did not coerce, retrying");
        fallbacks.retain(|(name, _)| *name != field);
        fallbacks.push((field, next));
    }
}

/// Deserializes one record from a data row.
struct RecordDeserializer<'a> {
    row: &'a [Cell],
    header: &'a [Cell],
    fallbacks: &'a Fallbacks,
}

impl<'de, 'a> de::Deserializer<'de> for RecordDeserializer<'a> {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, CodecError> {
        Err(CodecError::shape("destination must be a struct"))
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_map(ColumnAccess {
            fields: fields.iter(),
            row: self.row,
            header: self.header,
            fallbacks: self.fallbacks,
            current: None,
        })
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct seq tuple tuple_struct map enum
        identifier ignored_any
    }
}

/// Yields every declared field that is not omitted; absent columns come
/// back as zero values.
struct ColumnAccess<'a> {
    fields: std::slice::Iter<'static, &'static str>,
    row: &'a [Cell],
    header: &'a [Cell],
    fallbacks: &'a Fallbacks,
    current: Option<(&'static str, bool)>,
}

impl<'de, 'a> MapAccess<'de> for ColumnAccess<'a> {
    type Error = CodecError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, CodecError> {
        loop {
            let Some(&field) = self.fields.next() else {
                return Ok(None);
            };
            let fallback = fallback_for(self.fallbacks, field);
            if fallback == Some(Fallback::Omitted) {
                continue;
            }
            self.current = Some((field, fallback.is_some()));
            let key: StrDeserializer<'static, CodecError> = field.into_deserializer();
            return seed.deserialize(key).map(Some);
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, CodecError> {
        let (field, forced_absent) = self
            .current
            .take()
            .ok_or_else(|| CodecError::shape("value requested before key"))?;

        let cell = if forced_absent {
            None
        } else {
            column_index(self.header, field).and_then(|i| self.row.get(i))
        };
        let slot = match cell {
            Some(cell) => Slot::Scalar(Cow::Borrowed(cell)),
            None => Slot::Absent,
        };

        seed.deserialize(CellDeserializer::lenient(slot))
            .map_err(|e| e.in_field(field))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// What a field is being filled from.
enum Slot<'a> {
    /// Column missing from the header, or the row is too short
    Absent,
    Scalar(Cow<'a, Cell>),
    Array(Vec<JsonValue>),
    Object(JsonMap<String, JsonValue>),
}

impl<'a> Slot<'a> {
    fn from_json(value: JsonValue) -> Slot<'static> {
        match value {
            JsonValue::Array(items) => Slot::Array(items),
            JsonValue::Object(map) => Slot::Object(map),
            other => Slot::Scalar(Cow::Owned(Cell::from(other))),
        }
    }

    fn text(&self) -> Cow<'_, str> {
        match self {
            Slot::Absent => Cow::Borrowed(""),
            Slot::Scalar(cell) => cell.to_text(),
            Slot::Array(items) => Cow::Owned(serde_json::to_string(items).unwrap_or_default()),
            Slot::Object(map) => Cow::Owned(serde_json::to_string(map).unwrap_or_default()),
        }
    }

    fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    fn is_none(&self) -> bool {
        match self {
            Slot::Absent => true,
            Slot::Scalar(cell) => cell.is_empty(),
            _ => false,
        }
    }

    /// Text cells holding JSON are opened up; anything else that is not
    /// already structured becomes absent.
    fn into_structured(self) -> Slot<'static> {
        match self {
            Slot::Array(items) => Slot::Array(items),
            Slot::Object(map) => Slot::Object(map),
            Slot::Scalar(cell) => match cell.as_ref() {
                Cell::Text(s) => match serde_json::from_str::<JsonValue>(s) {
                    Ok(value @ (JsonValue::Array(_) | JsonValue::Object(_))) => {
                        Slot::from_json(value)
                    }
                    _ => {
                        trace!(text = %s, "cell is not structured, using zero value");
                        Slot::Absent
                    }
                },
                _ => Slot::Absent,
            },
            Slot::Absent => Slot::Absent,
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

/// Lenient deserializer for a single field value.
///
/// In strict mode (the inner value of an `Option`) a value that does not
/// coerce is reported instead of replaced by zero.
pub(crate) struct CellDeserializer<'a> {
    slot: Slot<'a>,
    strict: bool,
}

impl<'a> CellDeserializer<'a> {
    fn lenient(slot: Slot<'a>) -> Self {
        Self {
            slot,
            strict: false,
        }
    }

    fn absent() -> CellDeserializer<'static> {
        CellDeserializer::lenient(Slot::Absent)
    }

    fn items(self) -> Result<Vec<JsonValue>, CodecError> {
        let strict = self.strict;
        match self.slot.into_structured() {
            Slot::Array(items) => Ok(items),
            _ if strict => Err(CodecError::uncoercible("expected a JSON list")),
            _ => Ok(Vec::new()),
        }
    }

    fn object(self) -> Result<JsonMap<String, JsonValue>, CodecError> {
        let strict = self.strict;
        match self.slot.into_structured() {
            Slot::Object(map) => Ok(map),
            _ if strict => Err(CodecError::uncoercible("expected a JSON object")),
            _ => Ok(JsonMap::new()),
        }
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
                let text = self.slot.text();
                let value = match text.parse::<$ty>() {
                    Ok(v) => v,
                    Err(_) if self.strict => {
                        return Err(CodecError::uncoercible(format!(
                            "`{}` is not a valid {}",
                            text,
                            stringify!($ty)
                        )));
                    }
                    Err(_) => {
                        if !self.slot.is_absent() {
                            trace!(text = %text, ty = stringify!($ty), "cell did not parse, using zero value");
                        }
                        <$ty>::default()
                    }
                };
                visitor.$visit(value)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for CellDeserializer<'a> {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        match self.slot {
            Slot::Absent => visitor.visit_unit(),
            Slot::Scalar(cell) => match cell.as_ref() {
                Cell::Empty => visitor.visit_unit(),
                Cell::Bool(b) => visitor.visit_bool(*b),
                Cell::Int(i) => visitor.visit_i64(*i),
                Cell::Number(n) => visitor.visit_f64(*n),
                Cell::Text(s) => visitor.visit_str(s),
            },
            Slot::Array(items) => visitor.visit_seq(ItemsAccess::new(items, None)),
            Slot::Object(map) => visitor.visit_map(EntriesAccess::new(map)),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_i128 => i128, visit_i128;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_u128 => u128, visit_u128;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        if let Slot::Scalar(cell) = &self.slot {
            if let Cell::Bool(b) = cell.as_ref() {
                return visitor.visit_bool(*b);
            }
        }
        let text = self.slot.text();
        match parse_bool(&text) {
            Some(b) => visitor.visit_bool(b),
            None if self.strict => Err(CodecError::uncoercible(format!(
                "`{}` is not a valid bool",
                text
            ))),
            None => visitor.visit_bool(false),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        let text = self.slot.text();
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ if self.strict => Err(CodecError::uncoercible("expected a single character")),
            _ => visitor.visit_char(char::default()),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_string(self.slot.text().into_owned())
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_string(self.slot.text().into_owned())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_byte_buf(self.slot.text().as_bytes().to_vec())
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_byte_buf(self.slot.text().as_bytes().to_vec())
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        if self.slot.is_none() {
            visitor.visit_none()
        } else {
            visitor.visit_some(CellDeserializer {
                slot: self.slot,
                strict: true,
            })
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_seq(ItemsAccess::new(self.items()?, None))
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_seq(ItemsAccess::new(self.items()?, Some(len)))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_seq(ItemsAccess::new(self.items()?, Some(len)))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_map(EntriesAccess::new(self.object()?))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        visitor.visit_map(FieldAccess {
            fields: fields.iter(),
            object: self.object()?,
            current: None,
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        match self.slot {
            Slot::Absent => Err(CodecError::uncoercible("enum has no zero value")),
            Slot::Array(_) => Err(CodecError::uncoercible(
                "expected an enum variant, found a list",
            )),
            Slot::Object(map) => visitor.visit_enum(VariantAccessor::from_object(map)?),
            Slot::Scalar(cell) => {
                if let Cell::Text(s) = cell.as_ref() {
                    if let Ok(JsonValue::Object(map)) = serde_json::from_str::<JsonValue>(s) {
                        return visitor.visit_enum(VariantAccessor::from_object(map)?);
                    }
                }
                let name: StringDeserializer<CodecError> = cell.to_text().into_owned().into_deserializer();
                visitor.visit_enum(name)
            }
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_string(self.slot.text().into_owned())
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, CodecError> {
        visitor.visit_unit()
    }
}

struct ItemsAccess {
    items: std::vec::IntoIter<JsonValue>,
    padding: usize,
}

impl ItemsAccess {
    /// With `Some(len)` exactly `len` elements are produced, padding with
    /// zero values or dropping extras.
    fn new(mut items: Vec<JsonValue>, len: Option<usize>) -> Self {
        let padding = match len {
            Some(len) => {
                items.truncate(len);
                len - items.len()
            }
            None => 0,
        };
        Self {
            items: items.into_iter(),
            padding,
        }
    }
}

impl<'de> SeqAccess<'de> for ItemsAccess {
    type Error = CodecError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, CodecError> {
        if let Some(value) = self.items.next() {
            return seed
                .deserialize(CellDeserializer::lenient(Slot::from_json(value)))
                .map(Some);
        }
        if self.padding > 0 {
            self.padding -= 1;
            return seed.deserialize(CellDeserializer::absent()).map(Some);
        }
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len() + self.padding)
    }
}

struct EntriesAccess {
    entries: serde_json::map::IntoIter,
    pending: Option<JsonValue>,
}

impl EntriesAccess {
    fn new(map: JsonMap<String, JsonValue>) -> Self {
        Self {
            entries: map.into_iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for EntriesAccess {
    type Error = CodecError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, CodecError> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.pending = Some(value);
        // Keys go through the lenient path too, so `HashMap<u32, _>` works.
        seed.deserialize(CellDeserializer::lenient(Slot::Scalar(Cow::Owned(
            Cell::Text(key),
        ))))
        .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, CodecError> {
        let slot = self
            .pending
            .take()
            .map(Slot::from_json)
            .unwrap_or(Slot::Absent);
        seed.deserialize(CellDeserializer::lenient(slot))
    }
}

struct FieldAccess {
    fields: std::slice::Iter<'static, &'static str>,
    object: JsonMap<String, JsonValue>,
    current: Option<&'static str>,
}

impl<'de> MapAccess<'de> for FieldAccess {
    type Error = CodecError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, CodecError> {
        let Some(&field) = self.fields.next() else {
            return Ok(None);
        };
        self.current = Some(field);
        let key: StrDeserializer<'static, CodecError> = field.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, CodecError> {
        let slot = self
            .current
            .take()
            .and_then(|field| self.object.remove(field))
            .map(Slot::from_json)
            .unwrap_or(Slot::Absent);
        seed.deserialize(CellDeserializer::lenient(slot))
    }
}

/// Externally tagged enum value: `{"Variant": payload}`.
struct VariantAccessor {
    variant: String,
    value: JsonValue,
}

impl VariantAccessor {
    fn from_object(map: JsonMap<String, JsonValue>) -> Result<Self, CodecError> {
        if map.len() != 1 {
            return Err(CodecError::uncoercible(
                "expected an object with a single variant key",
            ));
        }
        match map.into_iter().next() {
            Some((variant, value)) => Ok(Self { variant, value }),
            None => Err(CodecError::uncoercible(
                "expected an object with a single variant key",
            )),
        }
    }
}

impl<'de> EnumAccess<'de> for VariantAccessor {
    type Error = CodecError;
    type Variant = CellDeserializer<'static>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), CodecError> {
        let key: StringDeserializer<CodecError> = self.variant.into_deserializer();
        let variant = seed.deserialize(key)?;
        Ok((
            variant,
            CellDeserializer::lenient(Slot::from_json(self.value)),
        ))
    }
}

impl<'de, 'a> VariantAccess<'de> for CellDeserializer<'a> {
    type Error = CodecError;

    fn unit_variant(self) -> Result<(), CodecError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, CodecError> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, CodecError> {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, CodecError> {
        de::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}
