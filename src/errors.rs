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

use error_chain::error_chain;
use std::io;

error_chain! {
    foreign_links {
        Io(io::Error);
        Toml(toml::de::Error);
    }

    errors {
        OutOfBounds {
            description("point lies outside the climber's current bounding box")
            display("point lies outside the climber's current bounding box")
        }

        OutOfRangeId(raw: u64, begin: u64, end: u64) {
            description("node id does not belong to this chunk's id range")
            display("node id {} is not in chunk range [{}, {})", raw, begin, end)
        }

        MalformedBlob(reason: String) {
            description("chunk blob is truncated or carries an unknown type tag")
            display("malformed chunk blob: {}", reason)
        }

        TransientEndpoint(path: String, attempt: u32) {
            description("endpoint operation failed but retries remain")
            display("endpoint operation on '{}' failed on attempt {}, retrying", path, attempt)
        }

        FatalEndpoint(path: String) {
            description("endpoint operation exhausted all retries")
            display("endpoint operation on '{}' did not succeed after 20 attempts", path)
        }

        MergeMismatch {
            description("chunks describe incompatible id-ranges or overlapping populated cells")
            display("chunks cannot be merged: incompatible id-ranges or overlapping cells")
        }

        InvalidStructure(reason: String) {
            description("structure parameters violate an invariant")
            display("invalid structure: {}", reason)
        }
    }
}
