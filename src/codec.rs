// Copyright 2016 The Cartographer Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::errors::*;
use crate::schema::Schema;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

/// Opaque compress/decompress of a byte sequence against a schema. The
/// schema parameter exists so a future codec can exploit per-dimension
/// structure (e.g. delta-coding positions); neither implementation here
/// does, but the core only ever calls through this trait, so a smarter
/// codec can be swapped in without touching `Chunk`.
pub trait Codec: Send + Sync {
    fn compress(&self, bytes: &[u8], schema: &Schema) -> Result<Vec<u8>>;
    fn decompress(&self, bytes: &[u8], schema: &Schema, expected_size: usize) -> Result<Vec<u8>>;
}

/// LZ4 block compression. The compressed block is prefixed with its own
/// `u32` length so `decompress` can split multiple concatenated blocks if
/// ever needed, and is otherwise a straight pass-through to the `lz4` crate.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn compress(&self, bytes: &[u8], _schema: &Schema) -> Result<Vec<u8>> {
        let mut encoder = lz4::EncoderBuilder::new()
            .build(Vec::new())
            .chain_err(|| "failed to create lz4 encoder")?;
        encoder
            .write_all(bytes)
            .chain_err(|| "failed to write to lz4 encoder")?;
        let (compressed, result) = encoder.finish();
        result.chain_err(|| "lz4 encoder failed to finish")?;

        let mut out = Vec::with_capacity(compressed.len() + 4);
        out.write_u32::<LittleEndian>(compressed.len() as u32)
            .unwrap();
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    fn decompress(&self, bytes: &[u8], _schema: &Schema, expected_size: usize) -> Result<Vec<u8>> {
        if bytes.len() < 4 {
            return Err(ErrorKind::MalformedBlob("lz4 payload shorter than its length prefix".to_string()).into());
        }
        let mut cursor = Cursor::new(bytes);
        let len = cursor.read_u32::<LittleEndian>()? as usize;
        let rest = &bytes[4..];
        if rest.len() < len {
            return Err(ErrorKind::MalformedBlob(
                "lz4 payload shorter than its declared length".to_string(),
            )
            .into());
        }
        let mut decoder = lz4::Decoder::new(&rest[..len]).chain_err(|| "failed to create lz4 decoder")?;
        let mut out = Vec::with_capacity(expected_size);
        decoder
            .read_to_end(&mut out)
            .chain_err(|| "failed to read lz4 decoder output")?;
        if out.len() != expected_size {
            return Err(ErrorKind::MalformedBlob(format!(
                "decompressed {} bytes, expected {}",
                out.len(),
                expected_size
            ))
            .into());
        }
        Ok(out)
    }
}

/// Identity codec. Used by tests (and small/debug builds) that want to
/// inspect the exact celled-record bytes without an intervening codec.
pub struct PassthroughCodec;

impl Codec for PassthroughCodec {
    fn compress(&self, bytes: &[u8], _schema: &Schema) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn decompress(&self, bytes: &[u8], _schema: &Schema, expected_size: usize) -> Result<Vec<u8>> {
        if bytes.len() != expected_size {
            return Err(ErrorKind::MalformedBlob(format!(
                "passthrough payload is {} bytes, expected {}",
                bytes.len(),
                expected_size
            ))
            .into());
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut bytes = Vec::new();
        for i in 0..1000u32 {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn lz4_round_trips() {
        let schema = Schema::xyz();
        let codec = Lz4Codec;
        let original = sample();
        let compressed = codec.compress(&original, &schema).unwrap();
        let decompressed = codec
            .decompress(&compressed, &schema, original.len())
            .unwrap();
        assert_eq!(original, decompressed);
    }

    #[test]
    fn lz4_rejects_wrong_expected_size() {
        let schema = Schema::xyz();
        let codec = Lz4Codec;
        let compressed = codec.compress(&sample(), &schema).unwrap();
        assert!(codec.decompress(&compressed, &schema, 3).is_err());
    }

    #[test]
    fn passthrough_round_trips() {
        let schema = Schema::xyz();
        let codec = PassthroughCodec;
        let original = sample();
        let compressed = codec.compress(&original, &schema).unwrap();
        assert_eq!(original, compressed);
        let decompressed = codec
            .decompress(&compressed, &schema, original.len())
            .unwrap();
        assert_eq!(original, decompressed);
    }
}
