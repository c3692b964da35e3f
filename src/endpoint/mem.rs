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
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory endpoint backing tests and the "the whole dataset fits in
/// RAM" deployment. Never fails transiently on its own; the retry path is
/// exercised separately with a test-only flaky endpoint.
#[derive(Default)]
pub struct MemEndpoint {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemEndpoint {
    pub fn new() -> Self {
        MemEndpoint {
            blobs: Mutex::new(HashMap::new()),
        }
    }
}

impl Endpoint for MemEndpoint {
    fn put_once(&self, path: &str, bytes: &[u8], _attempt: u32) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get_once(&self, path: &str, attempt: u32) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ErrorKind::TransientEndpoint(path.to_string(), attempt).into())
    }
}
