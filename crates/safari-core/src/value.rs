//! Structured value trees.
//!
//! Observations and actions are [`Value`] trees: leaf tensors of booleans,
//! integers, or floats, composed into tuples and string-keyed dicts. The
//! shape of a tree mirrors the [`Spec`](crate::spec::Spec) that describes it,
//! which is what lets generic code (validation, batching, serialization)
//! traverse any environment's data without knowing its schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BatchError;

// ---------------------------------------------------------------------------
// ElementType
// ---------------------------------------------------------------------------

/// Element type of a leaf tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Bool,
    Int,
    Float,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tensor
// ---------------------------------------------------------------------------

/// Dense row-major tensor of a single element type.
///
/// An empty `shape` denotes a scalar (exactly one element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    elements: Elements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Elements {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f32>),
}

impl Elements {
    fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    const fn dtype(&self) -> ElementType {
        match self {
            Self::Bool(_) => ElementType::Bool,
            Self::Int(_) => ElementType::Int,
            Self::Float(_) => ElementType::Float,
        }
    }
}

impl Tensor {
    /// Scalar float tensor.
    #[must_use]
    pub fn scalar_f32(value: f32) -> Self {
        Self {
            shape: Vec::new(),
            elements: Elements::Float(vec![value]),
        }
    }

    /// Scalar integer tensor.
    #[must_use]
    pub fn scalar_i64(value: i64) -> Self {
        Self {
            shape: Vec::new(),
            elements: Elements::Int(vec![value]),
        }
    }

    /// Scalar boolean tensor.
    #[must_use]
    pub fn scalar_bool(value: bool) -> Self {
        Self {
            shape: Vec::new(),
            elements: Elements::Bool(vec![value]),
        }
    }

    /// Float tensor with the given shape.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of `shape`.
    #[must_use]
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "data length must match shape"
        );
        Self {
            shape,
            elements: Elements::Float(data),
        }
    }

    /// Integer tensor with the given shape.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of `shape`.
    #[must_use]
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "data length must match shape"
        );
        Self {
            shape,
            elements: Elements::Int(data),
        }
    }

    /// Boolean tensor with the given shape.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of `shape`.
    #[must_use]
    pub fn from_bool(shape: Vec<usize>, data: Vec<bool>) -> Self {
        assert_eq!(
            data.len(),
            shape.iter().product::<usize>(),
            "data length must match shape"
        );
        Self {
            shape,
            elements: Elements::Bool(data),
        }
    }

    /// Zero-filled tensor of the given dtype and shape (`false` for bools).
    #[must_use]
    pub fn zeros(dtype: ElementType, shape: Vec<usize>) -> Self {
        let n = shape.iter().product();
        let elements = match dtype {
            ElementType::Bool => Elements::Bool(vec![false; n]),
            ElementType::Int => Elements::Int(vec![0; n]),
            ElementType::Float => Elements::Float(vec![0.0; n]),
        };
        Self { shape, elements }
    }

    /// Element type of this tensor.
    #[must_use]
    pub const fn dtype(&self) -> ElementType {
        self.elements.dtype()
    }

    /// Dimension sizes; empty for scalars.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Whether this is a scalar (empty shape).
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Float data, if this is a float tensor.
    #[must_use]
    pub fn as_f32s(&self) -> Option<&[f32]> {
        match &self.elements {
            Elements::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Integer data, if this is an integer tensor.
    #[must_use]
    pub fn as_i64s(&self) -> Option<&[i64]> {
        match &self.elements {
            Elements::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Boolean data, if this is a boolean tensor.
    #[must_use]
    pub fn as_bools(&self) -> Option<&[bool]> {
        match &self.elements {
            Elements::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// The single float value of a scalar float tensor.
    #[must_use]
    pub fn scalar_as_f32(&self) -> Option<f32> {
        match (&self.elements, self.is_scalar()) {
            (Elements::Float(v), true) => v.first().copied(),
            _ => None,
        }
    }

    /// The single integer value of a scalar integer tensor.
    #[must_use]
    pub fn scalar_as_i64(&self) -> Option<i64> {
        match (&self.elements, self.is_scalar()) {
            (Elements::Int(v), true) => v.first().copied(),
            _ => None,
        }
    }

    /// Every element widened to `f64`, in row-major order.
    ///
    /// Used by bounds checking, which compares all dtypes in one domain.
    #[must_use]
    pub fn iter_as_f64(&self) -> Vec<f64> {
        match &self.elements {
            Elements::Bool(v) => v.iter().map(|b| f64::from(u8::from(*b))).collect(),
            Elements::Int(v) => v.iter().map(|i| *i as f64).collect(),
            Elements::Float(v) => v.iter().map(|f| f64::from(*f)).collect(),
        }
    }

    /// Stack `lanes` tensors of identical shape and dtype along a new
    /// leading dimension.
    fn stack(lanes: &[&Self], path: &str) -> Result<Self, BatchError> {
        let first = lanes.first().ok_or(BatchError::EmptyBatch)?;
        if lanes
            .iter()
            .any(|t| t.shape != first.shape || t.dtype() != first.dtype())
        {
            return Err(BatchError::LaneMismatch { path: path.into() });
        }
        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(lanes.len());
        shape.extend_from_slice(&first.shape);
        let elements = match first.dtype() {
            ElementType::Bool => Elements::Bool(
                lanes
                    .iter()
                    .flat_map(|t| t.as_bools().unwrap_or_default().iter().copied())
                    .collect(),
            ),
            ElementType::Int => Elements::Int(
                lanes
                    .iter()
                    .flat_map(|t| t.as_i64s().unwrap_or_default().iter().copied())
                    .collect(),
            ),
            ElementType::Float => Elements::Float(
                lanes
                    .iter()
                    .flat_map(|t| t.as_f32s().unwrap_or_default().iter().copied())
                    .collect(),
            ),
        };
        Ok(Self { shape, elements })
    }

    /// Split a tensor with leading dimension `lanes` back into per-lane
    /// tensors.
    fn unstack(&self, lanes: usize, path: &str) -> Result<Vec<Self>, BatchError> {
        let leading = self.shape.first().copied().unwrap_or(0);
        if self.shape.is_empty() || leading != lanes {
            return Err(BatchError::LeadingDimMismatch {
                path: path.into(),
                expected: lanes,
                got: leading,
            });
        }
        let lane_shape: Vec<usize> = self.shape[1..].to_vec();
        let lane_len: usize = lane_shape.iter().product();
        let mut out = Vec::with_capacity(lanes);
        for i in 0..lanes {
            let range = i * lane_len..(i + 1) * lane_len;
            let elements = match &self.elements {
                Elements::Bool(v) => Elements::Bool(v[range].to_vec()),
                Elements::Int(v) => Elements::Int(v[range].to_vec()),
                Elements::Float(v) => Elements::Float(v[range].to_vec()),
            };
            out.push(Self {
                shape: lane_shape.clone(),
                elements,
            });
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A structured value: a leaf tensor, or a tuple/dict of nested values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Leaf(Tensor),
    Tuple(Vec<Value>),
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Scalar float leaf.
    #[must_use]
    pub fn scalar_f32(value: f32) -> Self {
        Self::Leaf(Tensor::scalar_f32(value))
    }

    /// Scalar integer leaf.
    #[must_use]
    pub fn scalar_i64(value: i64) -> Self {
        Self::Leaf(Tensor::scalar_i64(value))
    }

    /// Scalar boolean leaf.
    #[must_use]
    pub fn scalar_bool(value: bool) -> Self {
        Self::Leaf(Tensor::scalar_bool(value))
    }

    /// Dict value from `(name, value)` pairs.
    #[must_use]
    pub fn dict<I: IntoIterator<Item = (String, Self)>>(entries: I) -> Self {
        Self::Dict(entries.into_iter().collect())
    }

    /// The leaf tensor, if this value is a leaf.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&Tensor> {
        match self {
            Self::Leaf(t) => Some(t),
            _ => None,
        }
    }

    /// Child value by dict key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(map) => map.get(key),
            _ => None,
        }
    }

    /// Number of leaf tensors in the tree.
    #[must_use]
    pub fn num_leaves(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Tuple(children) => children.iter().map(Self::num_leaves).sum(),
            Self::Dict(map) => map.values().map(Self::num_leaves).sum(),
        }
    }
}

impl From<Tensor> for Value {
    fn from(tensor: Tensor) -> Self {
        Self::Leaf(tensor)
    }
}

// ---------------------------------------------------------------------------
// Stacking
// ---------------------------------------------------------------------------

/// Stack `lanes` structurally identical value trees, adding a leading batch
/// dimension to every leaf.
///
/// This is the isomorphic-map operation the batching wrapper relies on: the
/// result has the same tree structure as each input, with every leaf of shape
/// `S` replaced by a leaf of shape `[N, ..S]`.
pub fn stack(lanes: &[Value]) -> Result<Value, BatchError> {
    let refs: Vec<&Value> = lanes.iter().collect();
    stack_at(&refs, "value")
}

fn stack_at(lanes: &[&Value], path: &str) -> Result<Value, BatchError> {
    let first = lanes.first().ok_or(BatchError::EmptyBatch)?;
    match first {
        Value::Leaf(_) => {
            let tensors: Vec<&Tensor> = lanes
                .iter()
                .map(|v| v.as_leaf().ok_or(BatchError::LaneMismatch { path: path.into() }))
                .collect::<Result<_, _>>()?;
            Ok(Value::Leaf(Tensor::stack(&tensors, path)?))
        }
        Value::Tuple(children) => {
            let arity = children.len();
            let mut stacked = Vec::with_capacity(arity);
            for i in 0..arity {
                let child_path = format!("{path}.{i}");
                let child_lanes: Vec<&Value> = lanes
                    .iter()
                    .map(|v| match v {
                        Value::Tuple(c) if c.len() == arity => Ok(&c[i]),
                        _ => Err(BatchError::LaneMismatch {
                            path: child_path.clone(),
                        }),
                    })
                    .collect::<Result<_, _>>()?;
                stacked.push(stack_at(&child_lanes, &child_path)?);
            }
            Ok(Value::Tuple(stacked))
        }
        Value::Dict(map) => {
            let mut stacked = BTreeMap::new();
            for key in map.keys() {
                let child_path = format!("{path}.{key}");
                let child_lanes: Vec<&Value> = lanes
                    .iter()
                    .map(|v| {
                        v.get(key).ok_or(BatchError::LaneMismatch {
                            path: child_path.clone(),
                        })
                    })
                    .collect::<Result<_, _>>()?;
                stacked.insert(key.clone(), stack_at(&child_lanes, &child_path)?);
            }
            // A lane with extra keys is a structural mismatch too.
            for v in lanes {
                if let Value::Dict(m) = v {
                    if m.len() != map.len() {
                        return Err(BatchError::LaneMismatch { path: path.into() });
                    }
                } else {
                    return Err(BatchError::LaneMismatch { path: path.into() });
                }
            }
            Ok(Value::Dict(stacked))
        }
    }
}

/// Split a batched value tree (leading batch dimension on every leaf) back
/// into `lanes` per-lane trees. Inverse of [`stack`].
pub fn unstack(value: &Value, lanes: usize) -> Result<Vec<Value>, BatchError> {
    unstack_at(value, lanes, "value")
}

fn unstack_at(value: &Value, lanes: usize, path: &str) -> Result<Vec<Value>, BatchError> {
    match value {
        Value::Leaf(tensor) => Ok(tensor
            .unstack(lanes, path)?
            .into_iter()
            .map(Value::Leaf)
            .collect()),
        Value::Tuple(children) => {
            let mut per_lane: Vec<Vec<Value>> = (0..lanes).map(|_| Vec::new()).collect();
            for (i, child) in children.iter().enumerate() {
                let child_path = format!("{path}.{i}");
                for (lane, v) in unstack_at(child, lanes, &child_path)?.into_iter().enumerate() {
                    per_lane[lane].push(v);
                }
            }
            Ok(per_lane.into_iter().map(Value::Tuple).collect())
        }
        Value::Dict(map) => {
            let mut per_lane: Vec<BTreeMap<String, Value>> =
                (0..lanes).map(|_| BTreeMap::new()).collect();
            for (key, child) in map {
                let child_path = format!("{path}.{key}");
                for (lane, v) in unstack_at(child, lanes, &child_path)?.into_iter().enumerate() {
                    per_lane[lane].insert(key.clone(), v);
                }
            }
            Ok(per_lane.into_iter().map(Value::Dict).collect())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
