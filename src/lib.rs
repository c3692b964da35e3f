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

//! Indexes unbounded point clouds into a chunked, compressed octree (or
//! quadtree) so that bounded-depth spatial range queries can stream a
//! resolution-appropriate subset of points without scanning the whole
//! dataset. See [`builder::Builder`] for the write path and [`query::Query`]
//! for the read path.

#![recursion_limit = "1024"]

pub mod builder;
pub mod chunk;
pub mod climber;
pub mod codec;
pub mod config;
pub mod counters;
pub mod endpoint;
pub mod errors;
pub mod id;
pub mod point;
pub mod pool;
pub mod query;
pub mod schema;
pub mod split_climber;
pub mod structure;
pub mod tube;

pub use builder::Builder;
pub use config::Config;
pub use query::Query;
pub use structure::Structure;
