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
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

pub const TAIL_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkType {
    Sparse,
    Contiguous,
}

impl ChunkType {
    fn to_byte(self) -> u8 {
        match self {
            ChunkType::Sparse => 0,
            ChunkType::Contiguous => 1,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(ChunkType::Sparse),
            1 => Ok(ChunkType::Contiguous),
            other => Err(ErrorKind::MalformedBlob(format!("unknown chunk type byte {}", other)).into()),
        }
    }
}

/// Appends the 9-byte trailer (8-byte little-endian point count, 1-byte
/// type tag) that every chunk blob ends with.
pub fn write_tail(buf: &mut Vec<u8>, num_points: u64, chunk_type: ChunkType) {
    buf.write_u64::<LittleEndian>(num_points).unwrap();
    buf.push(chunk_type.to_byte());
}

/// Splits `bytes` into its compressed payload and the parsed tail, reading
/// back-to-front since the tail has a fixed width and the payload does not.
pub fn read_tail(bytes: &[u8]) -> Result<(&[u8], u64, ChunkType)> {
    if bytes.len() < TAIL_LEN {
        return Err(ErrorKind::MalformedBlob("chunk blob shorter than its tail".to_string()).into());
    }
    let split = bytes.len() - TAIL_LEN;
    let (payload, tail) = bytes.split_at(split);
    let mut cursor = &tail[..8];
    let num_points = cursor.read_u64::<LittleEndian>()?;
    let chunk_type = ChunkType::from_byte(tail[8])?;
    Ok((payload, num_points, chunk_type))
}
