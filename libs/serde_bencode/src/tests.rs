use std::collections::HashMap;
use std::io::{Cursor, Read as _};

use serde::Deserialize;
// enables in-place derives
use serde_derive as _;

use super::*;
use crate::value::{Dict, Kind, Slot};

fn dict<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Dict(
        entries
            .into_iter()
            .map(|(k, v)| (k.as_bytes().to_vec(), v))
            .collect(),
    )
}

fn decode_err<T>(buf: &[u8]) -> Error
where
    T: serde::de::DeserializeOwned + std::fmt::Debug,
{
    from_slice::<T>(buf).expect_err("decoding must fail")
}

#[test]
fn generic_values() {
    let cases: [(&[u8], Value); 11] = [
        (b"4:spam", Value::from("spam")),
        (b"i42e", Value::Int(42)),
        (b"i-42e", Value::Int(-42)),
        (
            b"l4:spami42ee",
            Value::List(vec![Value::from("spam"), Value::Int(42)]),
        ),
        (
            b"d3:foo3:bar5:helloi42ee",
            dict([("foo", Value::from("bar")), ("hello", Value::Int(42))]),
        ),
        (
            b"d4:dictd3:key5:valuee4:listli1ei2ei3eee",
            dict([
                ("dict", dict([("key", Value::from("value"))])),
                (
                    "list",
                    Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
                ),
            ]),
        ),
        (b"0:", Value::Str(Vec::new())),
        (b"le", Value::List(Vec::new())),
        (b"de", Value::Dict(Dict::new())),
        (b"2:\x01\x02", Value::Str(vec![1, 2])),
        (
            b"d2:\x01\x02i1ee",
            Value::Dict(Dict::from([(vec![1u8, 2], Value::Int(1))])),
        ),
    ];

    for (input, expected) in cases {
        let value: Value = from_slice(input).expect("must decode");
        assert_eq!(value, expected, "wrong value for {:?}", input.escape_ascii());
    }
}

#[test]
fn decoding_is_deterministic() {
    let input = b"d1:bli1e1:xe1:ad1:ci-7eee";
    let a = Decoder::from_slice(input).decode_value().expect("must decode");
    let b = Decoder::from_reader(Cursor::new(input.to_vec()))
        .decode_value()
        .expect("must decode");

    assert_eq!(a, b, "slice and reader must agree");
}

#[test]
fn integer_bounds() {
    for v in [i64::MIN, -1, 0, 1, i64::MAX] {
        let input = format!("i{v}e");
        let value: Value = from_slice(input.as_bytes()).expect("must decode");
        assert_eq!(value, Value::Int(v), "wrong value for {input}");
    }
}

#[test]
fn integer_not_canonical() {
    // accepted even though an encoder would never produce these
    assert_eq!(from_slice::<i64>(b"i-0e").expect("must decode"), 0, "-0 is 0");
    assert_eq!(from_slice::<i64>(b"i007e").expect("must decode"), 7, "leading zeros are ignored");
}

#[test]
fn string_leaves_cursor_after_value() {
    let mut decoder = Decoder::from_slice(b"5:a:b:cXYZ");
    let value = decoder.decode_value().expect("must decode");

    assert_eq!(value, Value::from("a:b:c"), "contents may contain separators");
    assert_eq!(decoder.remainder(), b"XYZ", "must stop right after the value");
}

#[test]
fn reader_leaves_cursor_after_value() {
    let mut decoder = Decoder::from_reader(Cursor::new(b"li1eeREST".to_vec()));
    let value = decoder.decode_value().expect("must decode");
    assert_eq!(value, Value::List(vec![Value::Int(1)]), "must decode list");

    let mut rest = String::new();
    decoder
        .into_reader()
        .read_to_string(&mut rest)
        .expect("cursor must be readable");
    assert_eq!(rest, "REST", "must not read past the value");
}

#[test]
fn sequential_decode() {
    fn check<R: read::Read>(mut decoder: Decoder<R>) {
        assert_eq!(decoder.decode::<i32>().expect("first"), 1, "first must be 1");
        assert_eq!(decoder.decode::<i32>().expect("second"), 2, "second must be 2");
        assert_eq!(
            decoder.decode::<String>().expect("third"),
            "spam",
            "third must be spam"
        );

        let err = decoder.decode::<i32>().expect_err("must be exhausted");
        assert!(err.is_eof(), "expected end of input, got {err:?}");
    }

    check(Decoder::from_slice(b"i1ei2e4:spam"));
    check(Decoder::from_reader(Cursor::new(b"i1ei2e4:spam".to_vec())));
}

#[test]
fn values_iterator() {
    let mut decoder = Decoder::from_slice(b"i1e0:le");
    let values: Vec<Value> = decoder
        .values()
        .collect::<Result<_>>()
        .expect("all values must decode");

    assert_eq!(
        values,
        [Value::Int(1), Value::Str(Vec::new()), Value::List(Vec::new())],
        "must yield all values in order"
    );

    let mut decoder = Decoder::from_slice(b"i1ex");
    let mut values = decoder.values();
    assert!(matches!(values.next(), Some(Ok(Value::Int(1)))), "first value is fine");
    assert!(
        matches!(values.next(), Some(Err(Error::InvalidLeadByte(b'x')))),
        "second value is malformed"
    );
    assert!(values.next().is_none(), "iterator must be fused after an error");
}

#[test]
fn trailing_bytes_ignored() {
    let v: u8 = from_slice(b"i5egarbage").expect("must decode");
    assert_eq!(v, 5, "trailing data must be ignored");
}

#[test]
fn structural_errors() {
    let cases: [(&[u8], fn(&Error) -> bool); 12] = [
        (b"5:abc", |e| matches!(e, Error::TruncatedInput { missing: 2 })),
        (b"i42", |e| matches!(e, Error::MalformedInteger)),
        (b"i42a2e", |e| matches!(e, Error::MalformedInteger)),
        (b"ie", |e| matches!(e, Error::MalformedInteger)),
        (b"i+1e", |e| matches!(e, Error::MalformedInteger)),
        (b"i9223372036854775808e", |e| matches!(e, Error::MalformedInteger)),
        (b"4spam", |e| matches!(e, Error::MalformedLength)),
        (b"12", |e| matches!(e, Error::MalformedLength)),
        (b"l4:spam", |e| matches!(e, Error::UnterminatedContainer)),
        (b"d3:foo3:bar", |e| matches!(e, Error::UnterminatedContainer)),
        (b"x", |e| matches!(e, Error::InvalidLeadByte(b'x'))),
        (b"di1e3:fooee", |e| matches!(e, Error::NonStringKey)),
    ];

    for (input, check) in cases {
        let err = decode_err::<Value>(input);
        assert!(check(&err), "wrong error for {:?}: {err:?}", input.escape_ascii());
        assert!(err.is_structural(), "must be structural: {err:?}");
    }
}

#[test]
fn lone_end_is_invalid() {
    assert!(
        matches!(decode_err::<Value>(b"e"), Error::InvalidLeadByte(b'e')),
        "end marker cannot start a value"
    );
}

#[test]
fn empty_input_is_eof() {
    assert!(decode_err::<Value>(b"").is_eof(), "empty input must be end of input");
}

#[test]
fn duplicate_keys_last_wins() {
    let value: Value = from_slice(b"d1:ai1e1:ai2ee").expect("must decode");
    assert_eq!(value, dict([("a", Value::Int(2))]), "last key must win");
}

#[test]
fn options_limits() {
    let options = DecoderOptions::new().with_reject_duplicate_keys(true);
    let err = Decoder::from_slice(b"d1:ai1e1:ai2ee")
        .with_options(options)
        .decode_value()
        .expect_err("duplicate must be rejected");
    assert!(matches!(&err, Error::DuplicateKey(k) if k == "a"), "wrong error: {err:?}");

    let options = DecoderOptions::new().with_max_depth(Some(2));
    let mut decoder = Decoder::from_slice(b"lleellleee").with_options(options);
    assert!(decoder.decode_value().is_ok(), "depth 2 is allowed");
    assert!(
        matches!(decoder.decode_value(), Err(Error::DepthLimitExceeded(2))),
        "depth 3 must be rejected"
    );

    let options = DecoderOptions::new().with_max_string_len(Some(3));
    let mut decoder = Decoder::from_slice(b"3:abc4:abcd").with_options(options);
    assert!(decoder.decode_value().is_ok(), "length 3 is allowed");
    assert!(
        matches!(
            decoder.decode_value(),
            Err(Error::StringTooLong { len: 4, limit: 3 })
        ),
        "length 4 must be rejected"
    );
}

#[test]
fn coerce_string() {
    let s: String = from_slice(b"4:spam").expect("must decode");
    assert_eq!(s, "spam", "must decode string");

    assert!(
        matches!(decode_err::<String>(b"2:\xff\xfe"), Error::InvalidUtf8),
        "strings must be utf-8"
    );
}

#[test]
fn coerce_bytes() {
    struct Bytes(Vec<u8>);

    impl<'de> Deserialize<'de> for Bytes {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct BytesVisitor;

            impl serde::de::Visitor<'_> for BytesVisitor {
                type Value = Bytes;

                fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str("bytes")
                }

                fn visit_byte_buf<E>(self, v: Vec<u8>) -> std::result::Result<Self::Value, E>
                where
                    E: serde::de::Error,
                {
                    Ok(Bytes(v))
                }
            }

            deserializer.deserialize_byte_buf(BytesVisitor)
        }
    }

    let Bytes(v) = from_slice(b"2:\xff\xfe").expect("binary data is fine");
    assert_eq!(v, [0xff, 0xfe], "bytes must be kept as-is");
}

#[test]
fn coerce_struct() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct Simple {
        #[serde(rename = "foo")]
        title: String,
        #[serde(rename = "count")]
        total: i32,
    }

    let v: Simple = from_slice(b"d3:foo3:bar5:counti42ee").expect("must decode");
    assert_eq!(
        v,
        Simple {
            title: "bar".to_owned(),
            total: 42,
        },
        "fields must be bound by key"
    );
}

#[test]
fn coerce_nested_struct() {
    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Inner {
        key: String,
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Outer {
        dict: Inner,
        list: Vec<u16>,
        items: Vec<Inner>,
        lookup: HashMap<String, Inner>,
    }

    let v: Outer = from_slice(
        b"d4:dictd3:key5:valuee5:itemsld3:key1:aed3:key1:bee4:listli1ei2ei3ee6:lookupd1:xd3:key1:ceee",
    )
    .expect("must decode");

    assert_eq!(
        v,
        Outer {
            dict: Inner {
                key: "value".to_owned(),
            },
            list: vec![1, 2, 3],
            items: vec![
                Inner { key: "a".to_owned() },
                Inner { key: "b".to_owned() },
            ],
            lookup: HashMap::from([("x".to_owned(), Inner { key: "c".to_owned() })]),
        },
        "nested containers must be decoded"
    );
}

#[test]
fn coerce_struct_partial_and_unknown_keys() {
    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Partial {
        #[serde(rename = "foo")]
        foo: String,
        #[serde(skip)]
        hidden: String,
        count: u8,
        note: Option<String>,
    }

    let v: Partial = from_slice(b"d3:foo3:bar6:hidden3:qux7:unknowni1ee").expect("must decode");
    assert_eq!(
        v,
        Partial {
            foo: "bar".to_owned(),
            hidden: String::new(),
            count: 0,
            note: None,
        },
        "missing fields must keep defaults and unknown keys be ignored"
    );
}

#[test]
fn coerce_struct_missing_key_without_default() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct Strict {
        a: i32,
        b: i32,
    }

    let v: Strict = from_slice(b"d1:ai1e1:bi2ee").expect("must decode");
    assert_eq!(v, Strict { a: 1, b: 2 }, "all keys present");

    let err = decode_err::<Strict>(b"d1:ai1ee");
    assert!(
        matches!(&err, Error::Custom(msg) if msg.contains("missing field `b`")),
        "missing keys need a default: {err:?}"
    );
}

#[test]
fn coerce_list() {
    let v: Vec<i64> = from_slice(b"li1ei2ei3ee").expect("must decode");
    assert_eq!(v, [1, 2, 3], "must decode list in order");

    let v: (u8, String) = from_slice(b"li1e1:xe").expect("must decode");
    assert_eq!(v, (1, "x".to_owned()), "must decode tuple");

    let err = decode_err::<[u8; 2]>(b"li1ei2ei3ee");
    assert!(matches!(err, Error::Custom(_)), "array length must match: {err:?}");

    let err = decode_err::<Vec<u8>>(b"li1ei256ee");
    assert!(
        matches!(err, Error::IntegerOverflow { value: 256, target: "u8" }),
        "element errors must abort: {err:?}"
    );
}

#[test]
fn coerce_maps() {
    use indexmap::IndexMap;

    let v: IndexMap<String, i64> = from_slice(b"d1:ai1e1:bi2ee").expect("must decode");
    assert_eq!(
        v,
        IndexMap::from([("a".to_owned(), 1), ("b".to_owned(), 2)]),
        "must decode map"
    );

    let v: HashMap<String, Value> = from_slice(b"d1:ali1ee1:bi2ee").expect("must decode");
    assert_eq!(v["a"], Value::List(vec![Value::Int(1)]), "values may be dynamic");

    assert!(
        matches!(
            decode_err::<HashMap<u32, i64>>(b"d1:1i1ee"),
            Error::UnsupportedShape(_)
        ),
        "map keys must be strings"
    );
}

#[test]
fn coerce_integer_ranges() {
    let err = decode_err::<i8>(b"i9223372036854775807e");
    assert!(
        matches!(err, Error::IntegerOverflow { target: "i8", .. }),
        "must overflow i8: {err:?}"
    );

    let err = decode_err::<u8>(b"i256e");
    assert!(
        matches!(err, Error::IntegerOverflow { value: 256, .. }),
        "must overflow u8: {err:?}"
    );

    for err in [
        decode_err::<u8>(b"i-1e"),
        decode_err::<u16>(b"i-1e"),
        decode_err::<u32>(b"i-1e"),
        decode_err::<u64>(b"i-1e"),
        decode_err::<u128>(b"i-1e"),
        decode_err::<usize>(b"i-1e"),
    ] {
        assert!(
            matches!(err, Error::NegativeToUnsigned { value: -1, .. }),
            "negative must not fit unsigned: {err:?}"
        );
        assert!(!err.is_structural(), "must be a coercion error");
    }

    let err = decode_err::<usize>(b"i-1e");
    assert!(
        matches!(err, Error::NegativeToUnsigned { target: "u64", .. }),
        "usize is requested as u64: {err:?}"
    );

    assert_eq!(from_slice::<i8>(b"i-128e").expect("fits"), i8::MIN, "i8::MIN fits");
    assert_eq!(from_slice::<u64>(b"i9223372036854775807e").expect("fits"), 9_223_372_036_854_775_807, "i64::MAX fits u64");
    assert_eq!(from_slice::<i128>(b"i-5e").expect("fits"), -5, "i128 must widen");
}

#[test]
fn coerce_type_mismatch() {
    #[derive(Debug, Deserialize)]
    struct Empty {}

    let cases = [
        decode_err::<i32>(b"4:spam"),
        decode_err::<String>(b"i42e"),
        decode_err::<Empty>(b"li1ee"),
        decode_err::<Vec<Value>>(b"de"),
        decode_err::<HashMap<String, i32>>(b"le"),
    ];

    for err in cases {
        assert!(
            matches!(err, Error::TypeMismatch { .. }),
            "expected type mismatch, got {err:?}"
        );
    }

    let err = decode_err::<String>(b"i1e");
    assert!(
        matches!(err, Error::TypeMismatch { expected: "string", found: Kind::Int }),
        "must report kinds: {err:?}"
    );
}

#[test]
fn coerce_unsupported() {
    assert!(matches!(decode_err::<bool>(b"i1e"), Error::UnsupportedShape("bool")), "bool");
    assert!(matches!(decode_err::<f64>(b"i1e"), Error::UnsupportedShape("f64")), "f64");
    assert!(matches!(decode_err::<char>(b"1:a"), Error::UnsupportedShape("char")), "char");
    assert!(matches!(decode_err::<()>(b"i1e"), Error::InvalidDestination(_)), "unit");
}

#[test]
fn coerce_enum() {
    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Event {
        Started,
        Progress(u32),
        Peer { ip: String, port: u16 },
    }

    let v: Vec<Event> =
        from_slice(b"l7:startedd8:progressi50eed4:peerd2:ip9:127.0.0.14:porti6881eeee")
            .expect("must decode");

    assert_eq!(
        v,
        [
            Event::Started,
            Event::Progress(50),
            Event::Peer {
                ip: "127.0.0.1".to_owned(),
                port: 6881,
            },
        ],
        "all variant kinds must decode"
    );

    assert!(
        matches!(decode_err::<Event>(b"d1:ai1e1:bi2ee"), Error::TypeMismatch { .. }),
        "enum dictionaries need exactly one key"
    );
}

#[test]
fn coerce_option_and_newtype() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct Port(u16);

    let v: Option<Port> = from_slice(b"i80e").expect("must decode");
    assert_eq!(v, Some(Port(80)), "present values are some");
}

#[test]
fn dynamic_destination() {
    let v: Value = from_slice(b"i42e").expect("must decode");
    assert_eq!(v, Value::Int(42), "integers stay integers");

    let mut slot = None;
    from_slice_dynamic(b"i42e", &mut slot).expect("empty slot accepts anything");
    assert_eq!(slot, Some(Value::Int(42)), "slot must be filled");

    let err = from_slice_dynamic(b"4:spam", &mut slot).expect_err("kind must not change");
    assert!(
        matches!(err, Error::TypeMismatch { expected: "integer", found: Kind::Str }),
        "wrong error: {err:?}"
    );
    assert_eq!(slot, Some(Value::Int(42)), "slot must be unchanged on error");

    let mut decoder = Decoder::from_slice(b"li1eeli2ei3ee");
    let mut slot = None;
    decoder.decode_dynamic(&mut slot).expect("first list");
    decoder.decode_dynamic(&mut slot).expect("second list");
    assert_eq!(
        slot,
        Some(Value::List(vec![Value::Int(2), Value::Int(3)])),
        "same kind must replace"
    );
}

#[test]
fn decode_into_place() {
    let mut place = vec![9u8];
    let mut decoder = Decoder::from_slice(b"li1ei2ee4:spam");

    decoder.decode_into(&mut place).expect("must decode");
    assert_eq!(place, [1, 2], "place must be replaced");

    decoder.decode_into(&mut place).expect_err("string is no list");
    assert_eq!(place, [1, 2], "place must be unchanged on error");
}

#[test]
fn decode_into_keeps_value_kind() {
    let mut place = Value::Int(1);
    let mut decoder = Decoder::from_slice(b"i2e4:spam");

    decoder.decode_into(&mut place).expect("same kind is accepted");
    assert_eq!(place, Value::Int(2), "same kind must replace");

    let err = decoder.decode_into(&mut place).expect_err("kind must not change");
    assert!(
        matches!(err, Error::TypeMismatch { expected: "integer", found: Kind::Str }),
        "wrong error: {err:?}"
    );
    assert_eq!(place, Value::Int(2), "place must be unchanged on error");
}

#[test]
fn decode_into_nested_slots() {
    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Holder {
        meta: Slot,
        keep: u32,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Pinned {
        meta: Value,
    }

    let mut place = Holder {
        meta: Slot::from(Value::Int(7)),
        keep: 9,
    };

    let err = Decoder::from_slice(b"d4:meta4:spame")
        .decode_into(&mut place)
        .expect_err("filled slot must keep its kind");
    assert!(
        matches!(err, Error::TypeMismatch { expected: "integer", found: Kind::Str }),
        "wrong error: {err:?}"
    );
    assert_eq!(
        place,
        Holder {
            meta: Slot::from(Value::Int(7)),
            keep: 9,
        },
        "place must be unchanged"
    );

    Decoder::from_slice(b"d4:metai8e4:keepi3ee")
        .decode_into(&mut place)
        .expect("same kind is accepted");
    assert_eq!(
        place,
        Holder {
            meta: Slot::from(Value::Int(8)),
            keep: 3,
        },
        "fields must be replaced"
    );

    let mut place = Holder::default();
    Decoder::from_slice(b"d4:meta4:spame")
        .decode_into(&mut place)
        .expect("empty slot accepts anything");
    assert_eq!(place.meta.get(), Some(&Value::from("spam")), "slot must be filled");
    assert_eq!(place.keep, 0, "missing keys keep their default");

    let mut place = Pinned {
        meta: Value::List(Vec::new()),
    };
    let err = Decoder::from_slice(b"d4:metai1ee")
        .decode_into(&mut place)
        .expect_err("value field must keep its kind");
    assert!(
        matches!(err, Error::TypeMismatch { expected: "list", found: Kind::Int }),
        "wrong error: {err:?}"
    );
    assert_eq!(place.meta, Value::List(Vec::new()), "value must be unchanged");
}

#[test]
fn from_value_direct() {
    let tree = dict([("n", Value::Int(-3))]);
    let v: HashMap<String, i8> = value::from_value(tree).expect("must fit");
    assert_eq!(v["n"], -3, "must decode from tree");
}
