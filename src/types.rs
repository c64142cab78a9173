//! Core data types for lazypipe-rs
//!
//! This module contains the dynamic values carried through node slots.
//!
//! # Main Types
//!
//! - [`Value`] - A dynamically typed value (scalars, strings, lists, maps, tensors)
//! - [`ValueKind`] - The type tag of a [`Value`], used by type validators
//! - [`Tensor`] - Row-major n-dimensional `f64` array used by processing functions
//! - [`ItemKey`] - Key for indexed access (`value[key]`)
//!
//! # Indexing
//!
//! Lists accept integer keys (negative keys count from the end), maps accept
//! string keys, and tensors accept integer keys on their first axis. A 1-D tensor
//! yields a `Float`, higher ranks yield the sub-tensor.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Keyword arguments bound to a deferred call.
pub type Kwargs = BTreeMap<String, Value>;

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Empty,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Tensor,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Empty => "empty",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Tensor => "tensor",
        };
        f.write_str(name)
    }
}

/// A dynamically typed value stored in a node slot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Slot has not been computed or assigned yet
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Tensor(Tensor),
}

impl Value {
    /// Type tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Empty => ValueKind::Empty,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Tensor(_) => ValueKind::Tensor,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of a scalar; ints widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(v) => Some(v),
            _ => None,
        }
    }

    /// Unpack a list value, or wrap anything else in a one-element vector.
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::List(items) => items,
            other => vec![other],
        }
    }

    /// Shape of the value, if it has one.
    ///
    /// Tensors report their shape. A list reports `[len]` followed by the
    /// shape of its elements when they all share one, so `[[1, 2], [3, 4]]`
    /// is `[2, 2]` while ragged or scalar lists stay `[len]`.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Value::Tensor(t) => Some(t.shape().to_vec()),
            Value::List(items) => {
                let mut shape = vec![items.len()];
                if let Some(inner) = items.first().and_then(Value::shape) {
                    if items.iter().all(|item| item.shape().as_ref() == Some(&inner)) {
                        shape.extend(inner);
                    }
                }
                Some(shape)
            }
            _ => None,
        }
    }

    /// Flattened numeric content: tensor data, (nested) numeric lists or a scalar.
    pub fn numbers(&self) -> Option<Vec<f64>> {
        match self {
            Value::Int(_) | Value::Float(_) => self.as_f64().map(|v| vec![v]),
            Value::Tensor(t) => Some(t.data().to_vec()),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.extend(item.numbers()?);
                }
                Some(out)
            }
            _ => None,
        }
    }

    /// Indexed access, `value[key]`.
    pub fn get_item(&self, key: &ItemKey) -> std::result::Result<Value, ItemAccessError> {
        match (self, key) {
            (Value::List(items), ItemKey::Index(index)) => {
                let pos = resolve_index(*index, items.len())?;
                Ok(items[pos].clone())
            }
            (Value::Map(map), ItemKey::Key(name)) => map
                .get(name)
                .cloned()
                .ok_or_else(|| ItemAccessError::MissingKey(name.clone())),
            (Value::Tensor(tensor), ItemKey::Index(index)) => tensor.index_axis0(*index),
            (Value::List(_) | Value::Tensor(_) | Value::Map(_), key) => {
                Err(ItemAccessError::KeyType {
                    key: key.clone(),
                    kind: self.kind(),
                })
            }
            _ => Err(ItemAccessError::NotIndexable { kind: self.kind() }),
        }
    }
}

fn resolve_index(index: i64, len: usize) -> std::result::Result<usize, ItemAccessError> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(ItemAccessError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl From<Tensor> for Value {
    fn from(v: Tensor) -> Self {
        Value::Tensor(v)
    }
}

/// Key used for indexed access on a node's value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKey {
    Index(i64),
    Key(String),
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Index(i) => write!(f, "{i}"),
            ItemKey::Key(k) => write!(f, "{k:?}"),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(v: i64) -> Self {
        ItemKey::Index(v)
    }
}

impl From<i32> for ItemKey {
    fn from(v: i32) -> Self {
        ItemKey::Index(v as i64)
    }
}

impl From<usize> for ItemKey {
    fn from(v: usize) -> Self {
        ItemKey::Index(v as i64)
    }
}

impl From<&str> for ItemKey {
    fn from(v: &str) -> Self {
        ItemKey::Key(v.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(v: String) -> Self {
        ItemKey::Key(v)
    }
}

/// Failure of an indexed access during execution
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemAccessError {
    #[error(
        "value of this node of type {kind} cannot be accessed with []; \
         ensure graph construction is made properly"
    )]
    NotIndexable { kind: ValueKind },

    #[error("key {key} cannot index a value of type {kind}")]
    KeyType { key: ItemKey, kind: ValueKind },

    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("key {0:?} not found")]
    MissingKey(String),
}

/// Row-major n-dimensional array of `f64`
///
/// The product of `shape` always equals the number of elements, including
/// for tensors read back through serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

/// Unchecked serde form of [`Tensor`]
#[derive(Deserialize)]
struct RawTensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = PipelineError;

    fn try_from(raw: RawTensor) -> Result<Self> {
        Tensor::new(raw.shape, raw.data)
    }
}

impl Tensor {
    /// Create a tensor, checking that `shape` covers exactly `data.len()` elements
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(PipelineError::Construction(format!(
                "tensor shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// 1-D tensor over `data`
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// 2-D tensor from equally sized rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(PipelineError::Construction(
                "all rows of a 2-D tensor must have the same length".to_string(),
            ));
        }
        let shape = vec![rows.len(), cols];
        Ok(Self {
            shape,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// Tensor of `shape` with every element set to `fill`
    pub fn full(shape: Vec<usize>, fill: f64) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![fill; len],
        }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.shape.len());
        index
            .iter()
            .zip(&self.shape)
            .fold(0, |acc, (&i, &dim)| acc * dim + i)
    }

    /// Element at a full multi-dimensional index
    pub fn get(&self, index: &[usize]) -> f64 {
        self.data[self.offset(index)]
    }

    pub fn set(&mut self, index: &[usize], value: f64) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    /// Apply `f` element-wise
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    pub fn mean(&self) -> Option<f64> {
        mean(&self.data)
    }

    /// Population variance
    pub fn variance(&self) -> Option<f64> {
        variance(&self.data)
    }

    /// `tensor[index]` along the first axis
    pub fn index_axis0(&self, index: i64) -> std::result::Result<Value, ItemAccessError> {
        let Some(&rows) = self.shape.first() else {
            return Err(ItemAccessError::NotIndexable {
                kind: ValueKind::Tensor,
            });
        };
        let row = resolve_index(index, rows)?;
        if self.shape.len() == 1 {
            return Ok(Value::Float(self.data[row]));
        }
        let inner_shape = self.shape[1..].to_vec();
        let stride: usize = inner_shape.iter().product();
        let data = self.data[row * stride..(row + 1) * stride].to_vec();
        Ok(Value::Tensor(Tensor {
            shape: inner_shape,
            data,
        }))
    }
}

/// Arithmetic mean of a slice
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population variance of a slice
pub fn variance(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    Some(data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / data.len() as f64)
}
