//! Record codec: typed records <-> grid rows.
//!
//! A record is any `serde` struct. Its fields bind to columns by name
//! (`#[serde(rename = "...")]` overrides the name, `#[serde(skip)]` leaves
//! the field out of the table entirely). Encoding is positional in field
//! order; decoding is keyed by the header row, so column order in the sheet
//! does not matter.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     #[serde(rename = "ID")]
//!     id: i64,
//!     #[serde(rename = "Name")]
//!     name: String,
//!     #[serde(skip)]
//!     session: Option<String>,
//! }
//!
//! let row = codec::encode(&user)?;            // [Int(1), Text("Alice")]
//! let back: User = codec::decode_one(&row, &header)?;
//! ```

mod de;
mod ser;
mod shape;

pub use shape::RecordShape;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

use crate::cell::{Cell, Row};
use quire_common::{QuireError, Result};

/// Internal serde error, surfaced as [`QuireError::Shape`].
#[derive(Error, Debug)]
pub(crate) enum CodecError {
    /// The value or destination does not have a usable structure
    #[error("{0}")]
    Shape(String),

    /// A cell could not be coerced and the target has no zero value to
    /// fall back on (an enum, or the inner value of an `Option`)
    #[error("{0}")]
    Uncoercible(String),

    /// [`CodecError::Uncoercible`] raised while filling a record field
    #[error("field `{field}`: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

impl CodecError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        CodecError::Shape(msg.into())
    }

    pub(crate) fn uncoercible(msg: impl Into<String>) -> Self {
        CodecError::Uncoercible(msg.into())
    }

    pub(crate) fn in_field(self, field: &'static str) -> Self {
        match self {
            CodecError::Shape(msg) => CodecError::Shape(format!("field `{}`: {}", field, msg)),
            CodecError::Uncoercible(message) => CodecError::Field { field, message },
            other => other,
        }
    }
}

impl serde::ser::Error for CodecError {
    fn custom<T: Display>(msg: T) -> Self {
        CodecError::Shape(msg.to_string())
    }
}

impl serde::de::Error for CodecError {
    fn custom<T: Display>(msg: T) -> Self {
        CodecError::Shape(msg.to_string())
    }

    fn invalid_type(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        CodecError::Uncoercible(format!("invalid type: {}, expected {}", unexp, exp))
    }

    fn invalid_value(unexp: serde::de::Unexpected<'_>, exp: &dyn serde::de::Expected) -> Self {
        CodecError::Uncoercible(format!("invalid value: {}, expected {}", unexp, exp))
    }

    fn unknown_variant(variant: &str, expected: &'static [&'static str]) -> Self {
        CodecError::Uncoercible(format!(
            "unknown variant `{}`, expected one of {:?}",
            variant, expected
        ))
    }
}

impl From<CodecError> for QuireError {
    fn from(err: CodecError) -> Self {
        QuireError::Shape(err.to_string())
    }
}

/// Index of the first header cell whose text equals `column` (case-sensitive).
///
/// Only text cells count; a numeric header cell never matches.
pub fn column_index(header: &[Cell], column: &str) -> Option<usize> {
    header
        .iter()
        .position(|cell| matches!(cell, Cell::Text(name) if name == column))
}

/// Encodes one record into a row, fields in declaration order.
pub fn encode<T: Serialize + ?Sized>(record: &T) -> Result<Row> {
    Ok(record.serialize(ser::RecordSerializer)?)
}

/// Encodes a sequence of records. An empty sequence yields no rows.
pub fn encode_many<T: Serialize + ?Sized>(records: &T) -> Result<Vec<Row>> {
    Ok(records.serialize(ser::BatchSerializer)?)
}

/// Decodes one data row into a record, looking columns up in `header`.
///
/// Columns missing from the header, cells beyond the end of a short row and
/// cells that do not coerce leave the field at its zero value (`None` for
/// an `Option`). An enum field with no usable cell falls back to
/// `#[serde(default)]`; without one the record is a shape error.
pub fn decode_one<T: DeserializeOwned>(row: &[Cell], header: &[Cell]) -> Result<T> {
    Ok(de::decode_record(row, header)?)
}

/// Decodes `rows` in order and appends them to `dest`.
///
/// `dest` is only extended once every row decoded.
pub fn decode_many<T: DeserializeOwned>(
    rows: &[Row],
    header: &[Cell],
    dest: &mut Vec<T>,
) -> Result<()> {
    let decoded = rows
        .iter()
        .map(|row| decode_one(row, header))
        .collect::<Result<Vec<T>>>()?;
    dest.extend(decoded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        #[serde(rename = "ID")]
        id: i64,
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Age")]
        age: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        #[serde(rename = "ID")]
        id: i64,
        #[serde(skip)]
        session: String,
        active: bool,
        score: f64,
        nickname: Option<String>,
        tags: Vec<String>,
        role: Role,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Role {
        Admin,
        Member,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Lenient {
        count: i32,
        ratio: f32,
        flag: bool,
        label: String,
        extra: Option<i64>,
        items: Vec<u8>,
        meta: BTreeMap<String, i64>,
    }

    fn header(names: &[&str]) -> Row {
        names.iter().map(|n| Cell::text(*n)).collect()
    }

    #[test]
    fn test_encode_in_declaration_order() {
        let user = User {
            id: 1,
            name: "Alice".to_string(),
            age: 30,
        };
        assert_eq!(
            encode(&user).unwrap(),
            vec![Cell::Int(1), Cell::text("Alice"), Cell::Int(30)]
        );
    }

    #[test]
    fn test_encode_omits_skipped_field() {
        let profile = Profile {
            id: 7,
            session: "secret".to_string(),
            active: true,
            score: 9.5,
            nickname: None,
            tags: vec!["a".to_string(), "b".to_string()],
            role: Role::Admin,
        };
        let row = encode(&profile).unwrap();
        assert_eq!(row.len(), RecordShape::of::<Profile>().unwrap().len());
        assert_eq!(
            row,
            vec![
                Cell::Int(7),
                Cell::Bool(true),
                Cell::Number(9.5),
                Cell::Empty,
                Cell::text(r#"["a","b"]"#),
                Cell::text("Admin"),
            ]
        );
    }

    #[test]
    fn test_encode_sees_through_references_and_options() {
        let user = User {
            id: 2,
            name: "Bob".to_string(),
            age: 25,
        };
        assert_eq!(encode(&Box::new(&user)).unwrap().len(), 3);
        assert_eq!(encode(&Some(&user)).unwrap().len(), 3);
        assert!(matches!(
            encode(&None::<User>),
            Err(QuireError::Shape(_))
        ));
    }

    #[test]
    fn test_encode_rejects_non_struct() {
        assert!(matches!(encode(&42), Err(QuireError::Shape(_))));
        assert!(matches!(encode("text"), Err(QuireError::Shape(_))));
        assert!(matches!(encode(&vec![1, 2]), Err(QuireError::Shape(_))));
    }

    #[test]
    fn test_encode_many() {
        let users = vec![
            User {
                id: 1,
                name: "Alice".to_string(),
                age: 30,
            },
            User {
                id: 2,
                name: "Bob".to_string(),
                age: 25,
            },
        ];
        let rows = encode_many(&users).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], Cell::text("Bob"));

        let empty: Vec<User> = Vec::new();
        assert!(encode_many(&empty).unwrap().is_empty());
        assert_eq!(encode_many(&users[..1]).unwrap().len(), 1);
    }

    #[test]
    fn test_encode_many_rejects_non_sequence() {
        let user = User {
            id: 1,
            name: "Alice".to_string(),
            age: 30,
        };
        assert!(matches!(encode_many(&user), Err(QuireError::Shape(_))));
        assert!(matches!(encode_many(&vec![1, 2]), Err(QuireError::Shape(_))));
    }

    #[test]
    fn test_round_trip_through_shape_header() {
        let profile = Profile {
            id: 3,
            session: String::new(),
            active: false,
            score: 12.25,
            nickname: Some("cj".to_string()),
            tags: vec!["x".to_string()],
            role: Role::Member,
        };
        let header = RecordShape::of::<Profile>().unwrap().header_row();
        let row = encode(&profile).unwrap();
        let back: Profile = decode_one(&row, &header).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_decode_is_keyed_by_header_not_position() {
        let header = header(&["Age", "Name", "ID"]);
        let row = vec![Cell::Number(30.0), Cell::text("Alice"), Cell::text("1")];
        let user: User = decode_one(&row, &header).unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "Alice".to_string(),
                age: 30
            }
        );
    }

    #[test]
    fn test_decode_short_row_and_missing_columns() {
        let header = header(&["ID", "Name", "Age"]);
        let row = vec![Cell::Int(4)];
        let user: User = decode_one(&row, &header).unwrap();
        assert_eq!(user.id, 4);
        assert_eq!(user.name, "");
        assert_eq!(user.age, 0);

        let user: User = decode_one(&[Cell::Int(9)], &header_row_without_id()).unwrap();
        assert_eq!(user.id, 0);
    }

    fn header_row_without_id() -> Row {
        header(&["Other"])
    }

    #[test]
    fn test_decode_first_matching_header_wins() {
        let header = header(&["ID", "Name", "Name"]);
        let row = vec![Cell::Int(1), Cell::text("first"), Cell::text("second")];
        let user: User = decode_one(&row, &header).unwrap();
        assert_eq!(user.name, "first");
    }

    #[test]
    fn test_decode_header_lookup_is_case_sensitive() {
        let header = header(&["id", "name"]);
        let user: User = decode_one(&[Cell::Int(1), Cell::text("x")], &header).unwrap();
        assert_eq!(user.id, 0);
        assert_eq!(user.name, "");
    }

    #[test]
    fn test_decode_swallows_coercion_failures() {
        let header = header(&["count", "ratio", "flag", "label", "extra", "items", "meta"]);
        let row = vec![
            Cell::text("twelve"),
            Cell::text("n/a"),
            Cell::text("yes"),
            Cell::Int(5),
            Cell::text("x"),
            Cell::text("not json"),
            Cell::text("[1,2]"),
        ];
        let value: Lenient = decode_one(&row, &header).unwrap();
        assert_eq!(
            value,
            Lenient {
                label: "5".to_string(),
                extra: None,
                ..Lenient::default()
            }
        );
    }

    #[test]
    fn test_decode_option_is_none_when_inner_value_does_not_coerce() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Optional {
            n: Option<i64>,
            flag: Option<bool>,
            items: Option<Vec<u8>>,
            ok: Option<u32>,
        }
        let header = header(&["n", "flag", "items", "ok"]);
        let row = vec![
            Cell::text("abc"),
            Cell::text("yes"),
            Cell::text("x"),
            Cell::text("7"),
        ];
        let value: Optional = decode_one(&row, &header).unwrap();
        assert_eq!(
            value,
            Optional {
                n: None,
                flag: None,
                items: None,
                ok: Some(7),
            }
        );
    }

    #[test]
    fn test_decode_unusable_enum_falls_back_to_default() {
        #[derive(Debug, Default, PartialEq, Deserialize)]
        enum Tier {
            Gold,
            #[default]
            Basic,
        }
        #[derive(Debug, PartialEq, Deserialize)]
        struct Member {
            name: String,
            #[serde(default)]
            tier: Tier,
            role: Option<Role>,
        }
        let header = header(&["name", "tier", "role"]);

        let member: Member = decode_one(
            &[Cell::text("a"), Cell::text("Platinum"), Cell::text("Guest")],
            &header,
        )
        .unwrap();
        assert_eq!(
            member,
            Member {
                name: "a".to_string(),
                tier: Tier::Basic,
                role: None,
            }
        );

        let member: Member = decode_one(&[Cell::text("b")], &header).unwrap();
        assert_eq!(member.tier, Tier::Basic);
        assert_eq!(member.role, None);

        let member: Member =
            decode_one(&[Cell::text("c"), Cell::text("Gold"), Cell::text("Admin")], &header)
                .unwrap();
        assert_eq!(member.tier, Tier::Gold);
        assert_eq!(member.role, Some(Role::Admin));
    }

    #[test]
    fn test_decode_coerces_across_representations() {
        let header = header(&["count", "ratio", "flag", "label", "extra", "items", "meta"]);
        let row = vec![
            Cell::Number(42.0),
            Cell::text("0.5"),
            Cell::text("TRUE"),
            Cell::Number(2.5),
            Cell::Int(-3),
            Cell::text("[1,2,3]"),
            Cell::text(r#"{"a":1}"#),
        ];
        let value: Lenient = decode_one(&row, &header).unwrap();
        assert_eq!(value.count, 42);
        assert_eq!(value.ratio, 0.5);
        assert!(value.flag);
        assert_eq!(value.label, "2.5");
        assert_eq!(value.extra, Some(-3));
        assert_eq!(value.items, vec![1, 2, 3]);
        assert_eq!(value.meta.get("a"), Some(&1));
    }

    #[test]
    fn test_decode_bool_grammar() {
        #[derive(Deserialize)]
        struct Flag {
            flag: bool,
        }
        let header = header(&["flag"]);
        for (text, expected) in [
            ("1", true),
            ("t", true),
            ("T", true),
            ("True", true),
            ("0", false),
            ("f", false),
            ("FALSE", false),
            ("maybe", false),
        ] {
            let flag: Flag = decode_one(&[Cell::text(text)], &header).unwrap();
            assert_eq!(flag.flag, expected, "{}", text);
        }
        let flag: Flag = decode_one(&[Cell::Int(1)], &header).unwrap();
        assert!(flag.flag);
    }

    #[test]
    fn test_decode_out_of_range_integer_is_zero() {
        #[derive(Deserialize)]
        struct Small {
            n: u8,
        }
        let small: Small = decode_one(&[Cell::Int(300)], &header(&["n"])).unwrap();
        assert_eq!(small.n, 0);
        let small: Small = decode_one(&[Cell::Int(-1)], &header(&["n"])).unwrap();
        assert_eq!(small.n, 0);
    }

    #[test]
    fn test_decode_option_none_only_for_empty() {
        #[derive(Deserialize)]
        struct Opt {
            a: Option<String>,
            b: Option<String>,
            c: Option<String>,
        }
        let opt: Opt = decode_one(&[Cell::Empty, Cell::text("")], &header(&["a", "b", "c"])).unwrap();
        assert_eq!(opt.a, None);
        assert_eq!(opt.b, Some(String::new()));
        assert_eq!(opt.c, None);
    }

    #[test]
    fn test_decode_missing_enum_is_shape_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct WithRole {
            role: Role,
        }
        let err = decode_one::<WithRole>(&[], &header(&["role"])).unwrap_err();
        assert!(matches!(err, QuireError::Shape(ref msg) if msg.contains("role")));

        let err = decode_one::<WithRole>(&[Cell::text("Guest")], &header(&["role"])).unwrap_err();
        assert!(matches!(err, QuireError::Shape(ref msg) if msg.contains("role")));
    }

    #[test]
    fn test_decode_rejects_non_struct_destination() {
        let header = header(&["ID"]);
        assert!(matches!(
            decode_one::<i64>(&[Cell::Int(1)], &header),
            Err(QuireError::Shape(_))
        ));
        assert!(matches!(
            decode_one::<BTreeMap<String, String>>(&[Cell::Int(1)], &header),
            Err(QuireError::Shape(_))
        ));
    }

    #[test]
    fn test_decode_many_preserves_order_and_appends() {
        let header = header(&["ID", "Name", "Age"]);
        let rows = vec![
            vec![Cell::Int(1), Cell::text("Alice"), Cell::Int(30)],
            vec![Cell::Int(3), Cell::text("Charlie"), Cell::Int(35)],
        ];
        let mut dest = vec![User {
            id: 0,
            name: "existing".to_string(),
            age: 1,
        }];
        decode_many(&rows, &header, &mut dest).unwrap();
        let names: Vec<_> = dest.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["existing", "Alice", "Charlie"]);

        decode_many::<User>(&[], &header, &mut dest).unwrap();
        assert_eq!(dest.len(), 3);
    }

    #[test]
    fn test_decode_many_leaves_dest_untouched_on_error() {
        let mut dest: Vec<i64> = vec![5];
        let rows = vec![vec![Cell::Int(1)]];
        assert!(decode_many(&rows, &header(&["ID"]), &mut dest).is_err());
        assert_eq!(dest, vec![5]);
    }

    #[test]
    fn test_column_index_only_matches_text() {
        let header = vec![Cell::Int(1), Cell::text("1"), Cell::text("Name")];
        assert_eq!(column_index(&header, "1"), Some(1));
        assert_eq!(column_index(&header, "Name"), Some(2));
        assert_eq!(column_index(&header, "name"), None);
    }
}
