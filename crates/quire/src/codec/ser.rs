//! Record -> row serialization.
//!
//! Only the outer shape is checked here: a record must serialize as a
//! struct, a batch as a sequence. Field values go through `serde_json` and
//! land in the row as the matching scalar cell.

use serde::ser::{self, Impossible, Serialize};

use super::CodecError;
use crate::cell::{Cell, Row};

macro_rules! reject_scalars {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<Self::Ok, Self::Error> {
                Err(Self::rejection())
            }
        )*
    };
}

macro_rules! reject_compounds {
    () => {
        fn serialize_unit(self) -> Result<Self::Ok, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_unit_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
        ) -> Result<Self::Ok, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_newtype_variant<T: ?Sized + Serialize>(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _value: &T,
        ) -> Result<Self::Ok, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_tuple_struct(
            self,
            _name: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeTupleStruct, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_tuple_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeTupleVariant, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Self::Error> {
            Err(Self::rejection())
        }

        fn serialize_struct_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeStructVariant, Self::Error> {
            Err(Self::rejection())
        }
    };
}

/// Serializes one record into a row of cells.
pub(crate) struct RecordSerializer;

impl RecordSerializer {
    fn rejection() -> CodecError {
        CodecError::shape("record must be a struct")
    }
}

impl ser::Serializer for RecordSerializer {
    type Ok = Row;
    type Error = CodecError;
    type SerializeSeq = Impossible<Row, CodecError>;
    type SerializeTuple = Impossible<Row, CodecError>;
    type SerializeTupleStruct = Impossible<Row, CodecError>;
    type SerializeTupleVariant = Impossible<Row, CodecError>;
    type SerializeMap = Impossible<Row, CodecError>;
    type SerializeStruct = FieldCollector;
    type SerializeStructVariant = Impossible<Row, CodecError>;

    reject_scalars!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    );

    reject_compounds!();

    fn serialize_none(self) -> Result<Row, CodecError> {
        Err(Self::rejection())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Row, CodecError> {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Row, CodecError> {
        value.serialize(self)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, CodecError> {
        Err(Self::rejection())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, CodecError> {
        Err(Self::rejection())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStruct, CodecError> {
        Ok(FieldCollector {
            row: Vec::with_capacity(len),
        })
    }
}

/// Collects struct fields, in declaration order, as cells.
pub(crate) struct FieldCollector {
    row: Row,
}

impl ser::SerializeStruct for FieldCollector {
    type Ok = Row;
    type Error = CodecError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), CodecError> {
        let json = serde_json::to_value(value)
            .map_err(|e| CodecError::shape(format!("field `{}`: {}", key, e)))?;
        self.row.push(Cell::from(json));
        Ok(())
    }

    // Conditionally skipped fields still own a column.
    fn skip_field(&mut self, _key: &'static str) -> Result<(), CodecError> {
        self.row.push(Cell::Empty);
        Ok(())
    }

    fn end(self) -> Result<Row, CodecError> {
        Ok(self.row)
    }
}

/// Serializes a sequence of records into rows.
pub(crate) struct BatchSerializer;

impl BatchSerializer {
    fn rejection() -> CodecError {
        CodecError::shape("records must be a sequence")
    }
}

impl ser::Serializer for BatchSerializer {
    type Ok = Vec<Row>;
    type Error = CodecError;
    type SerializeSeq = RowCollector;
    type SerializeTuple = RowCollector;
    type SerializeTupleStruct = Impossible<Vec<Row>, CodecError>;
    type SerializeTupleVariant = Impossible<Vec<Row>, CodecError>;
    type SerializeMap = Impossible<Vec<Row>, CodecError>;
    type SerializeStruct = Impossible<Vec<Row>, CodecError>;
    type SerializeStructVariant = Impossible<Vec<Row>, CodecError>;

    reject_scalars!(
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    );

    reject_compounds!();

    fn serialize_none(self) -> Result<Vec<Row>, CodecError> {
        Err(Self::rejection())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<Vec<Row>, CodecError> {
        Err(Self::rejection())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _value: &T,
    ) -> Result<Vec<Row>, CodecError> {
        Err(Self::rejection())
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<RowCollector, CodecError> {
        Ok(RowCollector {
            rows: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<RowCollector, CodecError> {
        Ok(RowCollector {
            rows: Vec::with_capacity(len),
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, CodecError> {
        Err(Self::rejection())
    }
}

pub(crate) struct RowCollector {
    rows: Vec<Row>,
}

impl RowCollector {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CodecError> {
        self.rows.push(value.serialize(RecordSerializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for RowCollector {
    type Ok = Vec<Row>;
    type Error = CodecError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CodecError> {
        self.push(value)
    }

    fn end(self) -> Result<Vec<Row>, CodecError> {
        Ok(self.rows)
    }
}

impl ser::SerializeTuple for RowCollector {
    type Ok = Vec<Row>;
    type Error = CodecError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), CodecError> {
        self.push(value)
    }

    fn end(self) -> Result<Vec<Row>, CodecError> {
        Ok(self.rows)
    }
}
