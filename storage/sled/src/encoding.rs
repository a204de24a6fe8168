//! Order-preserving encoding of primary keys and range endpoints.
//!
//! Each component is a tag byte followed by a body whose byte order matches the value order within that tag.
//! `Min` and `Max` sort below and above every value tag, so an endpoint padded with them brackets every key
//! sharing its prefix. Integers and floats share one numeric tag and compare by value.

use kvql_core::row::{KeyBound, PrimaryKey, RangeKey};
use kvql_core::value::Value;

const MIN: u8 = 0x00;
const BOOLEAN: u8 = 0x10;
const NUMBER: u8 = 0x20;
const STRING: u8 = 0x30;
const MAX: u8 = 0xFF;

pub fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Boolean(b) => {
            out.push(BOOLEAN);
            out.push(*b as u8);
        }
        Value::Integer(i) => {
            out.push(NUMBER);
            out.extend_from_slice(&float_bits(*i as f64).to_be_bytes());
            out.extend_from_slice(&integer_bits(*i).to_be_bytes());
        }
        Value::Float(f) => {
            out.push(NUMBER);
            out.extend_from_slice(&float_bits(*f).to_be_bytes());
            // tie-break for integers past 2^53, where `as f64` rounds
            out.extend_from_slice(&integer_bits(*f as i64).to_be_bytes());
        }
        Value::String(s) => {
            out.push(STRING);
            for byte in s.bytes() {
                out.push(byte);
                if byte == 0x00 {
                    out.push(0xFF);
                }
            }
            out.extend_from_slice(&[0x00, 0x01]);
        }
    }
}

fn integer_bits(i: i64) -> u64 { (i as u64) ^ (1 << 63) }

fn float_bits(f: f64) -> u64 {
    let bits = f.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

pub fn encode_key(key: &PrimaryKey) -> Vec<u8> {
    let mut out = Vec::new();
    for value in key.values() {
        encode_value(value, &mut out);
    }
    out
}

pub fn encode_range_key(key: &RangeKey) -> Vec<u8> {
    let mut out = Vec::new();
    for bound in key.bounds() {
        match bound {
            KeyBound::Min => out.push(MIN),
            KeyBound::Value(value) => encode_value(value, &mut out),
            KeyBound::Max => out.push(MAX),
        }
    }
    out
}
