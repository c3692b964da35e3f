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

use fnv::FnvHashMap;
use std::sync::Arc;

/// The wire type of one dimension in a point record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DataType {
    pub fn size_of(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }
}

/// One named, fixed-width field of a point record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub data_type: DataType,
    pub offset: usize,
}

/// An ordered list of dimensions describing one point record's on-disk
/// layout. This is the minimal slice of "point-record schema management"
/// the storage core actually touches - celled-schema construction and
/// dimension lookup by name - not a general point-format description
/// language (that lives outside this crate's scope).
#[derive(Debug, Clone)]
pub struct Schema {
    dimensions: Arc<Vec<Dimension>>,
    by_name: Arc<FnvHashMap<String, usize>>,
    point_size: usize,
}

pub struct SchemaBuilder {
    dimensions: Vec<Dimension>,
    offset: usize,
}

impl SchemaBuilder {
    pub fn dimension(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        let dim = Dimension {
            name,
            data_type,
            offset: self.offset,
        };
        self.offset += data_type.size_of();
        self.dimensions.push(dim);
        self
    }

    pub fn build(self) -> Schema {
        let point_size = self.offset;
        let mut by_name = FnvHashMap::default();
        for (idx, dim) in self.dimensions.iter().enumerate() {
            by_name.insert(dim.name.clone(), idx);
        }
        Schema {
            dimensions: Arc::new(self.dimensions),
            by_name: Arc::new(by_name),
            point_size,
        }
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            dimensions: Vec::new(),
            offset: 0,
        }
    }

    /// The schema every point-cloud chunk is built from by default: three
    /// doubles for position.
    pub fn xyz() -> Schema {
        Schema::builder()
            .dimension("X", DataType::F64)
            .dimension("Y", DataType::F64)
            .dimension("Z", DataType::F64)
            .build()
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.by_name.get(name).map(|&idx| &self.dimensions[idx])
    }

    pub fn point_size(&self) -> usize {
        self.point_size
    }

    /// This schema's fields, with an unsigned 8-byte `TubeId` dimension
    /// prepended and all other offsets shifted by 8 bytes. Used only in
    /// serialized chunk form, never for in-memory points.
    pub fn celled(&self) -> Schema {
        let mut builder = Schema::builder().dimension("TubeId", DataType::U64);
        for dim in self.dimensions.iter() {
            builder = builder.dimension(dim.name.clone(), dim.data_type);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_accumulate_in_declared_order() {
        let schema = Schema::xyz();
        assert_eq!(0, schema.dimension("X").unwrap().offset);
        assert_eq!(8, schema.dimension("Y").unwrap().offset);
        assert_eq!(16, schema.dimension("Z").unwrap().offset);
        assert_eq!(24, schema.point_size());
    }

    #[test]
    fn celled_prepends_tube_id_and_shifts_the_rest() {
        let schema = Schema::xyz();
        let celled = schema.celled();
        let tube_id = celled.dimension("TubeId").unwrap();
        assert_eq!(0, tube_id.offset);
        assert_eq!(DataType::U64, tube_id.data_type);
        assert_eq!(8, celled.dimension("X").unwrap().offset);
        assert_eq!(16, celled.dimension("Y").unwrap().offset);
        assert_eq!(24, celled.dimension("Z").unwrap().offset);
        assert_eq!(schema.point_size() + 8, celled.point_size());
    }

    #[test]
    fn unknown_dimension_is_none() {
        assert!(Schema::xyz().dimension("Intensity").is_none());
    }
}
