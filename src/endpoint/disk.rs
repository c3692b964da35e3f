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

use super::Endpoint;
use crate::errors::*;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk endpoint: one file per blob, named by `path`, directly under
/// `root`. Chunk ids always serialize as plain decimal digits, so `path`
/// never needs subdirectories; a `path` containing a separator is rejected
/// rather than silently nested, since that would let a corrupt id escape
/// `root`.
pub struct DiskEndpoint {
    root: PathBuf,
}

impl DiskEndpoint {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskEndpoint { root: root.into() }
    }

    fn file_path(&self, path: &str) -> Result<PathBuf> {
        if path.contains('/') || path.contains('\\') || path == ".." {
            return Err(ErrorKind::MalformedBlob(format!(
                "endpoint path must not contain a separator: {}",
                path
            ))
            .into());
        }
        Ok(self.root.join(path))
    }
}

impl Endpoint for DiskEndpoint {
    fn put_once(&self, path: &str, bytes: &[u8], _attempt: u32) -> Result<()> {
        let file_path = self.file_path(path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, bytes)?;
        Ok(())
    }

    fn get_once(&self, path: &str, attempt: u32) -> Result<Vec<u8>> {
        let file_path = self.file_path(path)?;
        if !Path::new(&file_path).exists() {
            return Err(ErrorKind::TransientEndpoint(path.to_string(), attempt).into());
        }
        Ok(fs::read(&file_path)?)
    }
}
