/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! InfluxDB line protocol encoding.
//!
//! See <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use itoa::Buffer;

use crate::point::{DataPoint, FieldValue};
use crate::precision::TimestampPrecision;
use crate::tag::TagMap;

#[inline]
fn is_measurement_special(b: u8) -> bool {
    matches!(b, b',' | b' ')
}

#[inline]
fn is_key_special(b: u8) -> bool {
    matches!(b, b',' | b'=' | b' ')
}

fn write_escaped(buf: &mut Vec<u8>, s: &str, special: fn(u8) -> bool) {
    for b in s.bytes() {
        if special(b) {
            buf.push(b'\\');
        }
        buf.push(b);
    }
}

pub(crate) fn write_measurement(buf: &mut Vec<u8>, s: &str) {
    write_escaped(buf, s, is_measurement_special);
}

/// Tag keys, tag values and field keys share the same escaping rule.
pub(crate) fn write_key(buf: &mut Vec<u8>, s: &str) {
    write_escaped(buf, s, is_key_special);
}

pub(crate) fn escaped_measurement_len(s: &str) -> usize {
    s.len() + s.bytes().filter(|b| is_measurement_special(*b)).count()
}

pub(crate) fn escaped_key_len(s: &str) -> usize {
    s.len() + s.bytes().filter(|b| is_key_special(*b)).count()
}

/// Tags with an empty value are not part of the series key.
pub(crate) fn encoded_tags(tags: &TagMap) -> impl Iterator<Item = (&str, &str)> {
    tags.iter().filter(|(_, v)| !v.is_empty())
}

fn write_tag(buf: &mut Vec<u8>, k: &str, v: &str) {
    write_key(buf, k);
    buf.push(b'=');
    write_key(buf, v);
}

pub(crate) fn write_tags(buf: &mut Vec<u8>, tags: &TagMap) {
    let mut iter = encoded_tags(tags);
    let Some((k, v)) = iter.next() else {
        return;
    };
    write_tag(buf, k, v);
    for (k, v) in iter {
        buf.push(b',');
        write_tag(buf, k, v);
    }
}

pub(crate) fn write_field_value(buf: &mut Vec<u8>, value: FieldValue) {
    match value {
        FieldValue::Integer(i) => {
            buf.extend_from_slice(Buffer::new().format(i).as_bytes());
            buf.push(b'i');
        }
        FieldValue::Float(f) => {
            buf.extend_from_slice(ryu::Buffer::new().format(f).as_bytes());
        }
    }
}

/// Append one line for `point`, terminated by `\n`.
pub(crate) fn write_point(buf: &mut Vec<u8>, point: &DataPoint, precision: TimestampPrecision) {
    write_measurement(buf, point.measurement());
    for (k, v) in encoded_tags(point.tags()) {
        buf.push(b',');
        write_tag(buf, k, v);
    }

    let mut first = true;
    for (key, value) in point.fields() {
        buf.push(if first { b' ' } else { b',' });
        first = false;
        write_key(buf, key);
        buf.push(b'=');
        write_field_value(buf, value);
    }

    // leave the timestamp to the server if it doesn't fit
    if let Some(ts) = precision.timestamp(point.time()) {
        buf.push(b' ');
        buf.extend_from_slice(Buffer::new().format(ts).as_bytes());
    }
    buf.push(b'\n');
}
