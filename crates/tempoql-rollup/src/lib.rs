//! Materialized-aggregate ("rollup") index definitions.
//!
//! A rollup index precomputes interval/sliding-window aggregates for one
//! source table. Its definition (window geometry, per-function column-id
//! lists, an opaque tags-filter expression string) is persisted next to the
//! table through a length-prefixed little-endian binary encoding.
//!
//! The codec honors two invariants the metadata plane depends on:
//! [`RollupIndex::encoded_len`] returns exactly the number of bytes
//! [`RollupIndex::encode_into`] writes, and decode reproduces every field
//! including list counts, orderings, and the verbatim tags-filter bytes
//! (explicit length prefix; the filter may contain any byte).

pub mod store;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tempoql_error::{Result, TempoError};
use tempoql_types::{ColId, FuncId, TableUid, TimeUnit};

pub use store::{RollupCursor, RollupStore};

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// One aggregate function applied to a list of source columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupFuncColumns {
    pub func_id: FuncId,
    pub col_ids: SmallVec<[ColId; 4]>,
}

/// Definition of one rollup index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupIndex {
    pub version: u16,
    pub interval_unit: TimeUnit,
    pub sliding_unit: TimeUnit,
    /// Index name; bounded by [`tempoql_types::INDEX_NAME_LEN`].
    pub index_name: String,
    /// Timezone the window boundaries are aligned in.
    pub timezone: String,
    pub table_uid: TableUid,
    pub interval: i64,
    pub sliding: i64,
    /// Aggregates, in declaration order.
    pub func_columns: Vec<RollupFuncColumns>,
    /// Opaque tags-filter expression, arbitrary bytes, possibly empty.
    pub tags_filter: Vec<u8>,
}

/// Every rollup index of one source table, in save order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupBundle {
    pub indexes: Vec<RollupIndex>,
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

impl RollupIndex {
    /// Exact size of the wire encoding, in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let mut len = 2 // version
            + 1 // interval unit
            + 1 // sliding unit
            + 2 + self.index_name.len()
            + 2 + self.timezone.len()
            + 8 // table uid
            + 8 // interval
            + 8 // sliding
            + 4; // function count
        for func in &self.func_columns {
            len += 2 + 4 + 2 * func.col_ids.len();
        }
        len + 4 + self.tags_filter.len()
    }

    /// Append the wire encoding to `out`; returns the number of bytes
    /// written, which always equals [`RollupIndex::encoded_len`].
    pub fn encode_into(&self, out: &mut Vec<u8>) -> usize {
        let start = out.len();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.push(self.interval_unit.code());
        out.push(self.sliding_unit.code());
        put_bytes16(out, self.index_name.as_bytes());
        put_bytes16(out, self.timezone.as_bytes());
        out.extend_from_slice(&self.table_uid.to_le_bytes());
        out.extend_from_slice(&self.interval.to_le_bytes());
        out.extend_from_slice(&self.sliding.to_le_bytes());
        out.extend_from_slice(&(self.func_columns.len() as u32).to_le_bytes());
        for func in &self.func_columns {
            out.extend_from_slice(&func.func_id.to_le_bytes());
            out.extend_from_slice(&(func.col_ids.len() as u32).to_le_bytes());
            for col_id in &func.col_ids {
                out.extend_from_slice(&col_id.to_le_bytes());
            }
        }
        out.extend_from_slice(&(self.tags_filter.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.tags_filter);
        out.len() - start
    }

    /// The wire encoding as a fresh buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        let _written = self.encode_into(&mut out);
        out
    }

    /// Decode one definition from the front of `bytes`; returns it together
    /// with the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(bytes);
        let version = r.u16("version")?;
        let interval_unit = r.time_unit("interval unit")?;
        let sliding_unit = r.time_unit("sliding unit")?;
        let index_name = r.string16("index name")?;
        let timezone = r.string16("timezone")?;
        let table_uid = r.i64("table uid")?;
        let interval = r.i64("interval")?;
        let sliding = r.i64("sliding")?;

        let func_count = r.u32("function count")? as usize;
        let mut func_columns = Vec::with_capacity(func_count.min(1024));
        for _ in 0..func_count {
            let func_id = r.u16("function id")?;
            let col_count = r.u32("column count")? as usize;
            let mut col_ids = SmallVec::with_capacity(col_count.min(1024));
            for _ in 0..col_count {
                col_ids.push(r.i16("column id")?);
            }
            func_columns.push(RollupFuncColumns { func_id, col_ids });
        }

        let filter_len = r.u32("tags filter length")? as usize;
        let tags_filter = r.take(filter_len, "tags filter")?.to_vec();

        Ok((
            Self {
                version,
                interval_unit,
                sliding_unit,
                index_name,
                timezone,
                table_uid,
                interval,
                sliding,
                func_columns,
                tags_filter,
            },
            r.consumed(),
        ))
    }
}

impl RollupBundle {
    /// Exact size of the wire encoding, in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        4 + self
            .indexes
            .iter()
            .map(RollupIndex::encoded_len)
            .sum::<usize>()
    }

    /// Append the wire encoding to `out`; returns the bytes written.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> usize {
        let start = out.len();
        out.extend_from_slice(&(self.indexes.len() as u32).to_le_bytes());
        for index in &self.indexes {
            let _written = index.encode_into(out);
        }
        out.len() - start
    }

    /// The wire encoding as a fresh buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        let _written = self.encode_into(&mut out);
        out
    }

    /// Decode a bundle from the front of `bytes`; returns it with the
    /// number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut r = Reader::new(bytes);
        let count = r.u32("index count")? as usize;
        let mut indexes = Vec::with_capacity(count.min(1024));
        let mut offset = r.consumed();
        for _ in 0..count {
            let (index, used) = RollupIndex::decode(&bytes[offset..])?;
            indexes.push(index);
            offset += used;
        }
        Ok((Self { indexes }, offset))
    }
}

fn put_bytes16(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
}

// ---------------------------------------------------------------------------
// Decode cursor
// ---------------------------------------------------------------------------

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn consumed(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(TempoError::CorruptEncoding {
                detail: format!(
                    "truncated {field}: need {len} bytes at offset {}, have {}",
                    self.pos,
                    self.bytes.len() - self.pos
                ),
            }),
        }
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u16(&mut self, field: &str) -> Result<u16> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn i16(&mut self, field: &str) -> Result<i16> {
        let b = self.take(2, field)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i64(&mut self, field: &str) -> Result<i64> {
        let b = self.take(8, field)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn time_unit(&mut self, field: &str) -> Result<TimeUnit> {
        let code = self.u8(field)?;
        TimeUnit::from_code(code).ok_or_else(|| TempoError::CorruptEncoding {
            detail: format!("invalid {field} code {code}"),
        })
    }

    fn string16(&mut self, field: &str) -> Result<String> {
        let len = self.u16(field)? as usize;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TempoError::CorruptEncoding {
            detail: format!("{field} is not valid UTF-8"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::smallvec;
    use tempoql_types::PRIMARY_TS_COL_ID;

    /// A definition shaped like the ones the translator emits: five
    /// aggregates over ten columns each, columns starting at the primary
    /// timestamp.
    fn sample_index(name: &str) -> RollupIndex {
        RollupIndex {
            version: 0,
            interval_unit: TimeUnit::Day,
            sliding_unit: TimeUnit::Hour,
            index_name: name.to_owned(),
            timezone: "Asia/Shanghai".to_owned(),
            table_uid: 1_234_567_890,
            interval: 1,
            sliding: 0,
            func_columns: (0..5)
                .map(|n| RollupFuncColumns {
                    func_id: n,
                    col_ids: (0..10).map(|i| i + PRIMARY_TS_COL_ID).collect(),
                })
                .collect(),
            tags_filter: b"I'm tags filter".to_vec(),
        }
    }

    #[test]
    fn test_round_trip_field_for_field() {
        let index = sample_index("rollup_index_test");
        let bytes = index.to_bytes();
        let (decoded, consumed) = RollupIndex::decode(&bytes).expect("decode");

        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded.version, index.version);
        assert_eq!(decoded.interval_unit, index.interval_unit);
        assert_eq!(decoded.sliding_unit, index.sliding_unit);
        assert_eq!(decoded.index_name, index.index_name);
        assert_eq!(decoded.timezone, index.timezone);
        assert_eq!(decoded.table_uid, index.table_uid);
        assert_eq!(decoded.interval, index.interval);
        assert_eq!(decoded.sliding, index.sliding);
        assert_eq!(decoded.func_columns.len(), index.func_columns.len());
        for (got, want) in decoded.func_columns.iter().zip(&index.func_columns) {
            assert_eq!(got.func_id, want.func_id);
            assert_eq!(got.col_ids, want.col_ids);
        }
        assert_eq!(decoded.tags_filter, index.tags_filter);
    }

    #[test]
    fn test_length_computation_parity() {
        let index = sample_index("parity");
        let mut out = Vec::new();
        let written = index.encode_into(&mut out);
        assert_eq!(written, index.encoded_len());
        assert_eq!(out.len(), index.encoded_len());
    }

    #[test]
    fn test_empty_lists_and_filter() {
        let index = RollupIndex {
            func_columns: Vec::new(),
            tags_filter: Vec::new(),
            ..sample_index("empty")
        };
        let bytes = index.to_bytes();
        assert_eq!(bytes.len(), index.encoded_len());
        let (decoded, consumed) = RollupIndex::decode(&bytes).expect("decode");
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, index);
    }

    #[test]
    fn test_tags_filter_may_hold_any_byte() {
        let index = RollupIndex {
            tags_filter: vec![0x00, 0xFF, b'\n', 0x00, b'Z'],
            ..sample_index("binary_filter")
        };
        let (decoded, _) = RollupIndex::decode(&index.to_bytes()).expect("decode");
        assert_eq!(decoded.tags_filter, index.tags_filter);
    }

    #[test]
    fn test_truncated_input_is_an_error_not_a_panic() {
        let bytes = sample_index("trunc").to_bytes();
        for cut in [0, 1, 3, bytes.len() / 2, bytes.len() - 1] {
            let err = RollupIndex::decode(&bytes[..cut]).expect_err("must fail");
            assert!(matches!(err, TempoError::CorruptEncoding { .. }), "cut at {cut}");
        }
    }

    #[test]
    fn test_invalid_unit_code_rejected() {
        let mut bytes = sample_index("bad_unit").to_bytes();
        bytes[2] = 0xEE;
        let err = RollupIndex::decode(&bytes).expect_err("must fail");
        assert!(matches!(err, TempoError::CorruptEncoding { ref detail } if detail.contains("interval unit")));
    }

    #[test]
    fn test_bundle_round_trip() {
        let bundle = RollupBundle {
            indexes: vec![sample_index("first"), sample_index("second")],
        };
        let bytes = bundle.to_bytes();
        assert_eq!(bytes.len(), bundle.encoded_len());
        let (decoded, consumed) = RollupBundle::decode(&bytes).expect("decode");
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, bundle);
    }

    #[test]
    fn test_definition_serde_shape_is_stable() {
        let func = RollupFuncColumns {
            func_id: 3,
            col_ids: smallvec![1, 2],
        };
        let json = serde_json::to_value(&func).expect("serialize");
        assert_eq!(json["func_id"], 3);
        assert_eq!(json["col_ids"], serde_json::json!([1, 2]));
    }

    // --- property coverage ---

    fn arb_time_unit() -> impl Strategy<Value = TimeUnit> {
        (0u8..10).prop_map(|code| TimeUnit::from_code(code).expect("valid code"))
    }

    fn arb_index() -> impl Strategy<Value = RollupIndex> {
        (
            any::<u16>(),
            arb_time_unit(),
            arb_time_unit(),
            "[a-z_]{1,24}",
            "[A-Za-z/]{0,24}",
            any::<i64>(),
            any::<i64>(),
            any::<i64>(),
            prop::collection::vec(
                (any::<u16>(), prop::collection::vec(any::<i16>(), 0..8)),
                0..5,
            ),
            prop::collection::vec(any::<u8>(), 0..64),
        )
            .prop_map(
                |(
                    version,
                    interval_unit,
                    sliding_unit,
                    index_name,
                    timezone,
                    table_uid,
                    interval,
                    sliding,
                    funcs,
                    tags_filter,
                )| RollupIndex {
                    version,
                    interval_unit,
                    sliding_unit,
                    index_name,
                    timezone,
                    table_uid,
                    interval,
                    sliding,
                    func_columns: funcs
                        .into_iter()
                        .map(|(func_id, col_ids)| RollupFuncColumns {
                            func_id,
                            col_ids: col_ids.into(),
                        })
                        .collect(),
                    tags_filter,
                },
            )
    }

    proptest! {
        #[test]
        fn prop_codec_round_trip(index in arb_index()) {
            let bytes = index.to_bytes();
            prop_assert_eq!(bytes.len(), index.encoded_len());
            let (decoded, consumed) = RollupIndex::decode(&bytes).expect("decode");
            prop_assert_eq!(consumed, bytes.len());
            prop_assert_eq!(decoded, index);
        }
    }
}
