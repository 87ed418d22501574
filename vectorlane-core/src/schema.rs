//! Schema value objects: data types, metrics, index types and field layouts.
//!
//! These are consumed by `CreateCollection` and `CreateIndex` requests and
//! returned by the describe operations. [`FieldType`] and [`CollectionSchema`]
//! are built through validating builders like every request parameter.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{
    check_name, check_range, require, MAX_DIMENSION, MAX_VARCHAR_LENGTH, MIN_DIMENSION,
};

/// Data type of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    #[serde(rename = "VARCHAR")]
    VarChar,
    BinaryVector,
    FloatVector,
}

impl DataType {
    /// Returns true for `BinaryVector` and `FloatVector`.
    #[inline]
    pub fn is_vector(self) -> bool {
        matches!(self, Self::BinaryVector | Self::FloatVector)
    }
}

/// Similarity metric used by a vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    /// Euclidean distance.
    L2,
    /// Inner product.
    Ip,
    Hamming,
    Jaccard,
    Tanimoto,
    Substructure,
    Superstructure,
}

impl MetricType {
    /// Returns true for metrics defined only on binary vectors.
    #[inline]
    pub fn is_binary(self) -> bool {
        !matches!(self, Self::L2 | Self::Ip)
    }
}

/// Index algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    Flat,
    IvfFlat,
    IvfSq8,
    IvfPq,
    Hnsw,
    Annoy,
    RhnswFlat,
    RhnswPq,
    RhnswSq,
    #[serde(rename = "DISKANN")]
    DiskAnn,
    #[serde(rename = "AUTOINDEX")]
    AutoIndex,
    BinFlat,
    BinIvfFlat,
    Trie,
}

impl IndexType {
    /// Index types that only apply to binary vector fields.
    #[inline]
    pub fn is_binary(self) -> bool {
        matches!(self, Self::BinFlat | Self::BinIvfFlat)
    }

    /// Index types that apply to scalar (VarChar) fields.
    #[inline]
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Trie)
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the wire name.
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(name)) => f.write_str(&name),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Read consistency guaranteed by a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    Strong,
    Session,
    #[default]
    Bounded,
    Eventually,
}

/// Definition of a single collection field.
///
/// # Example
///
/// ```
/// use vectorlane_core::{DataType, FieldType};
///
/// let field = FieldType::builder()
///     .with_name("embedding")
///     .with_data_type(DataType::FloatVector)
///     .with_dimension(384)
///     .build()
///     .unwrap();
///
/// assert_eq!(field.dimension(), Some(384));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    name: String,
    #[serde(default)]
    description: String,
    data_type: DataType,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    auto_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dimension: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    type_params: BTreeMap<String, String>,
}

impl FieldType {
    pub fn builder() -> FieldTypeBuilder {
        FieldTypeBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_auto_id(&self) -> bool {
        self.auto_id
    }

    /// Vector dimension; set only on vector fields.
    pub fn dimension(&self) -> Option<u32> {
        self.dimension
    }

    /// Maximum string length; set only on VarChar fields.
    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    /// Additional type parameters passed through to the server.
    pub fn type_params(&self) -> &BTreeMap<String, String> {
        &self.type_params
    }
}

/// Builder for [`FieldType`].
#[derive(Debug, Clone, Default)]
pub struct FieldTypeBuilder {
    name: Option<String>,
    description: Option<String>,
    data_type: Option<DataType>,
    primary_key: bool,
    auto_id: bool,
    dimension: Option<u32>,
    max_length: Option<u32>,
    type_params: BTreeMap<String, String>,
}

impl FieldTypeBuilder {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Marks the field as the collection's primary key (Int64 or VarChar only).
    pub fn with_primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Lets the server generate primary key values. Requires an Int64 primary key.
    pub fn with_auto_id(mut self, auto_id: bool) -> Self {
        self.auto_id = auto_id;
        self
    }

    /// Vector dimension, 1 to 32768. Binary vectors need a multiple of 8.
    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Maximum string length of a VarChar field, 1 to 255.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_type_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.type_params.insert(key.into(), value.into());
        self
    }

    /// Merges `params` into the existing type parameters.
    pub fn with_type_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.type_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Validates the field definition.
    pub fn build(&self) -> Result<FieldType> {
        let name = require("field_name", &self.name)?;
        check_name("field_name", name)?;
        let data_type = *require("data_type", &self.data_type)?;

        match (data_type.is_vector(), self.dimension) {
            (true, None) => return Err(Error::validation("dimension", "is required for vector fields")),
            (true, Some(dim)) => {
                check_range("dimension", dim, MIN_DIMENSION..=MAX_DIMENSION)?;
                if data_type == DataType::BinaryVector && dim % 8 != 0 {
                    return Err(Error::validation(
                        "dimension",
                        format!("{} is not a multiple of 8 for a binary vector", dim),
                    ));
                }
            }
            (false, Some(_)) => {
                return Err(Error::validation("dimension", "only applies to vector fields"))
            }
            (false, None) => {}
        }

        match (data_type, self.max_length) {
            (DataType::VarChar, None) => {
                return Err(Error::validation("max_length", "is required for VarChar fields"))
            }
            (DataType::VarChar, Some(len)) => {
                check_range("max_length", len, 1..=MAX_VARCHAR_LENGTH)?
            }
            (_, Some(_)) => {
                return Err(Error::validation("max_length", "only applies to VarChar fields"))
            }
            (_, None) => {}
        }

        if self.primary_key && !matches!(data_type, DataType::Int64 | DataType::VarChar) {
            return Err(Error::validation(
                "primary_key",
                format!("{:?} cannot be a primary key; use Int64 or VarChar", data_type),
            ));
        }
        if self.auto_id && !(self.primary_key && data_type == DataType::Int64) {
            return Err(Error::validation("auto_id", "requires an Int64 primary key"));
        }

        Ok(FieldType {
            name: name.clone(),
            description: self.description.clone().unwrap_or_default(),
            data_type,
            primary_key: self.primary_key,
            auto_id: self.auto_id,
            dimension: self.dimension,
            max_length: self.max_length,
            type_params: self.type_params.clone(),
        })
    }
}

/// Ordered list of fields that make up a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    #[serde(default)]
    description: String,
    fields: Vec<FieldType>,
}

impl CollectionSchema {
    pub fn builder() -> CollectionSchemaBuilder {
        CollectionSchemaBuilder::default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn fields(&self) -> &[FieldType] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The primary key field.
    pub fn primary_field(&self) -> Option<&FieldType> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// All vector fields, in declaration order.
    pub fn vector_fields(&self) -> impl Iterator<Item = &FieldType> {
        self.fields.iter().filter(|f| f.data_type.is_vector())
    }
}

/// Builder for [`CollectionSchema`].
#[derive(Debug, Clone, Default)]
pub struct CollectionSchemaBuilder {
    description: Option<String>,
    fields: Vec<FieldType>,
}

impl CollectionSchemaBuilder {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a field.
    pub fn add_field(mut self, field: FieldType) -> Self {
        self.fields.push(field);
        self
    }

    /// Replaces all fields.
    pub fn with_fields(mut self, fields: Vec<FieldType>) -> Self {
        self.fields = fields;
        self
    }

    /// Validates the schema as a whole. Each field was validated when built.
    pub fn build(&self) -> Result<CollectionSchema> {
        if self.fields.is_empty() {
            return Err(Error::validation("fields", "schema needs at least one field"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::validation(
                    "fields",
                    format!("duplicate field name {:?}", field.name),
                ));
            }
        }

        let primary_keys = self.fields.iter().filter(|f| f.primary_key).count();
        if primary_keys != 1 {
            return Err(Error::validation(
                "primary_key",
                format!("schema needs exactly one primary key, found {}", primary_keys),
            ));
        }

        if !self.fields.iter().any(|f| f.data_type.is_vector()) {
            return Err(Error::validation("fields", "schema needs at least one vector field"));
        }

        Ok(CollectionSchema {
            description: self.description.clone().unwrap_or_default(),
            fields: self.fields.clone(),
        })
    }
}
