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

use crate::codec::{Codec, Lz4Codec, PassthroughCodec};
use crate::errors::*;
use crate::structure::Structure;
use serde_derive::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which concrete `Codec` a `Config` resolves to. Kept as a plain enum
/// rather than a trait object in the serialized form, since a TOML file
/// has no way to name a Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Lz4,
    Passthrough,
}

impl CodecKind {
    pub fn build(self) -> Box<dyn Codec> {
        match self {
            CodecKind::Lz4 => Box::new(Lz4Codec),
            CodecKind::Passthrough => Box::new(PassthroughCodec),
        }
    }
}

/// The minimal configuration surface needed to open an existing tree or
/// start building a new one: its geometry, which codec its chunks are
/// compressed with, and where its blobs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub structure: SerializableStructure,
    pub codec: CodecKind,
    pub endpoint_root: PathBuf,
}

/// `Structure` is deliberately not `Serialize`/`Deserialize` itself - its
/// constructor enforces invariants a deserializer could otherwise bypass.
/// This mirrors the raw fields and goes through `Structure::new` in
/// `Config::load`/`Config::new`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SerializableStructure {
    pub dimensions: u32,
    pub nominal_chunk_depth: u32,
    pub cold_depth_begin: u32,
    pub sparse_depth_begin: u32,
    pub base_chunk_points: u64,
}

impl Config {
    pub fn new(structure: Structure, codec: CodecKind, endpoint_root: impl Into<PathBuf>) -> Self {
        Config {
            structure: SerializableStructure {
                dimensions: structure.dimensions(),
                nominal_chunk_depth: structure.nominal_chunk_depth(),
                cold_depth_begin: structure.cold_depth_begin(),
                sparse_depth_begin: structure.sparse_depth_begin(),
                base_chunk_points: structure.base_chunk_points(),
            },
            codec,
            endpoint_root: endpoint_root.into(),
        }
    }

    pub fn structure(&self) -> Result<Structure> {
        let s = &self.structure;
        Structure::new(
            s.dimensions,
            s.nominal_chunk_depth,
            s.cold_depth_begin,
            s.sparse_depth_begin,
            s.base_chunk_points,
        )
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.structure()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).chain_err(|| "failed to serialize config to TOML")?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_through_toml() {
        let structure = Structure::new(3, 5, 5, 0, 256).unwrap();
        let dir = tempdir().unwrap();
        let config = Config::new(structure, CodecKind::Lz4, dir.path().join("chunks"));

        let path = dir.path().join("config.toml");
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(config.codec, loaded.codec);
        assert_eq!(config.endpoint_root, loaded.endpoint_root);
        assert_eq!(structure, loaded.structure().unwrap());
    }

    #[test]
    fn rejects_invalid_structure_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
                codec = "lz4"
                endpoint_root = "chunks"

                [structure]
                dimensions = 3
                nominal_chunk_depth = 5
                cold_depth_begin = 4
                sparse_depth_begin = 0
                base_chunk_points = 256
            "#,
        )
        .unwrap();
        assert!(Config::load(&path).is_err());
    }
}
