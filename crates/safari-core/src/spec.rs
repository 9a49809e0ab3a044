//! Recursive specs describing the shape, dtype, and bounds of value trees.
//!
//! A [`Spec`] mirrors the structure of the [`Value`](crate::value::Value)
//! it describes: leaf specs constrain individual tensors, `Tuple`/`Dict`
//! specs aggregate children. Validation is a pure predicate; on failure the
//! returned [`SpecError`] names the offending field path.
//!
//! Specs are constructed once per environment instance and never mutated.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::value::{ElementType, Tensor, Value};

// ---------------------------------------------------------------------------
// Spec
// ---------------------------------------------------------------------------

/// Structural description of a value: leaf tensor constraints or a composite
/// of named/ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Spec {
    /// Unbounded tensor of a fixed dtype and shape.
    Array {
        dtype: ElementType,
        shape: Vec<usize>,
    },
    /// Tensor with inclusive element-wise bounds.
    BoundedArray {
        dtype: ElementType,
        shape: Vec<usize>,
        minimum: f64,
        maximum: f64,
    },
    /// Scalar integer in `[0, num_values)`.
    Discrete { num_values: i64 },
    /// Ordered composite.
    Tuple(Vec<Spec>),
    /// Named composite.
    Dict(BTreeMap<String, Spec>),
}

impl Spec {
    /// Unbounded float tensor spec.
    #[must_use]
    pub const fn float(shape: Vec<usize>) -> Self {
        Self::Array {
            dtype: ElementType::Float,
            shape,
        }
    }

    /// Scalar float spec (the default reward spec).
    #[must_use]
    pub const fn float_scalar() -> Self {
        Self::Array {
            dtype: ElementType::Float,
            shape: Vec::new(),
        }
    }

    /// Bounded float tensor spec.
    #[must_use]
    pub const fn bounded_float(shape: Vec<usize>, minimum: f64, maximum: f64) -> Self {
        Self::BoundedArray {
            dtype: ElementType::Float,
            shape,
            minimum,
            maximum,
        }
    }

    /// Scalar float in `[0, 1]` (the default discount spec).
    #[must_use]
    pub const fn unit_interval() -> Self {
        Self::BoundedArray {
            dtype: ElementType::Float,
            shape: Vec::new(),
            minimum: 0.0,
            maximum: 1.0,
        }
    }

    /// Scalar integer in `[0, num_values)`.
    #[must_use]
    pub const fn discrete(num_values: i64) -> Self {
        Self::Discrete { num_values }
    }

    /// Boolean tensor spec.
    #[must_use]
    pub const fn bools(shape: Vec<usize>) -> Self {
        Self::Array {
            dtype: ElementType::Bool,
            shape,
        }
    }

    /// Named composite spec from `(name, child)` pairs.
    #[must_use]
    pub fn dict<I: IntoIterator<Item = (String, Self)>>(entries: I) -> Self {
        Self::Dict(entries.into_iter().collect())
    }

    /// Validate `value` against this spec.
    ///
    /// Checks structure, shape, dtype, and bounds, recursing into composites.
    /// Pure: neither the spec nor the value is modified. The first failure is
    /// reported with its field path (e.g. `value.items.0`).
    pub fn validate(&self, value: &Value) -> Result<(), SpecError> {
        self.validate_at(value, "value")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), SpecError> {
        match self {
            Self::Array { dtype, shape } => {
                let tensor = expect_leaf(value, path)?;
                check_layout(tensor, *dtype, shape, path)
            }
            Self::BoundedArray {
                dtype,
                shape,
                minimum,
                maximum,
            } => {
                let tensor = expect_leaf(value, path)?;
                check_layout(tensor, *dtype, shape, path)?;
                check_bounds(tensor, *minimum, *maximum, path)
            }
            Self::Discrete { num_values } => {
                let tensor = expect_leaf(value, path)?;
                check_layout(tensor, ElementType::Int, &[], path)?;
                check_bounds(tensor, 0.0, (*num_values - 1) as f64, path)
            }
            Self::Tuple(children) => {
                let Value::Tuple(values) = value else {
                    return Err(SpecError::StructureMismatch {
                        path: path.into(),
                        expected: "tuple",
                    });
                };
                if values.len() != children.len() {
                    return Err(SpecError::ArityMismatch {
                        path: path.into(),
                        expected: children.len(),
                        got: values.len(),
                    });
                }
                for (i, (child, v)) in children.iter().zip(values).enumerate() {
                    child.validate_at(v, &format!("{path}.{i}"))?;
                }
                Ok(())
            }
            Self::Dict(children) => {
                let Value::Dict(values) = value else {
                    return Err(SpecError::StructureMismatch {
                        path: path.into(),
                        expected: "dict",
                    });
                };
                for (key, child) in children {
                    let v = values.get(key).ok_or_else(|| SpecError::MissingField {
                        path: path.into(),
                        field: key.clone(),
                    })?;
                    child.validate_at(v, &format!("{path}.{key}"))?;
                }
                for key in values.keys() {
                    if !children.contains_key(key) {
                        return Err(SpecError::UnexpectedField {
                            path: path.into(),
                            field: key.clone(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Deterministic placeholder value conforming to this spec.
    ///
    /// Zero-filled, clamped into bounds where zero is out of range. Useful
    /// for shape inference and testing without running an episode.
    #[must_use]
    pub fn generate_value(&self) -> Value {
        match self {
            Self::Array { dtype, shape } => Value::Leaf(Tensor::zeros(*dtype, shape.clone())),
            Self::BoundedArray {
                dtype,
                shape,
                minimum,
                maximum,
            } => {
                let fill = 0.0_f64.clamp(*minimum, *maximum);
                Value::Leaf(filled(*dtype, shape.clone(), fill))
            }
            Self::Discrete { .. } => Value::scalar_i64(0),
            Self::Tuple(children) => {
                Value::Tuple(children.iter().map(Self::generate_value).collect())
            }
            Self::Dict(children) => Value::Dict(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.generate_value()))
                    .collect(),
            ),
        }
    }

    /// The spec of a batched value: every leaf gains a leading dimension of
    /// size `n`. `Discrete` leaves become bounded integer arrays of shape
    /// `[n]`.
    #[must_use]
    pub fn with_leading_dim(&self, n: usize) -> Self {
        let prepend = |shape: &[usize]| {
            let mut out = Vec::with_capacity(shape.len() + 1);
            out.push(n);
            out.extend_from_slice(shape);
            out
        };
        match self {
            Self::Array { dtype, shape } => Self::Array {
                dtype: *dtype,
                shape: prepend(shape),
            },
            Self::BoundedArray {
                dtype,
                shape,
                minimum,
                maximum,
            } => Self::BoundedArray {
                dtype: *dtype,
                shape: prepend(shape),
                minimum: *minimum,
                maximum: *maximum,
            },
            Self::Discrete { num_values } => Self::BoundedArray {
                dtype: ElementType::Int,
                shape: vec![n],
                minimum: 0.0,
                maximum: (*num_values - 1) as f64,
            },
            Self::Tuple(children) => {
                Self::Tuple(children.iter().map(|c| c.with_leading_dim(n)).collect())
            }
            Self::Dict(children) => Self::Dict(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.with_leading_dim(n)))
                    .collect(),
            ),
        }
    }

    /// Random value conforming to this spec.
    ///
    /// Bounded leaves sample uniformly within their bounds; unbounded floats
    /// sample from `[0, 1)`, unbounded ints from `{0, 1}`. Takes
    /// `&mut impl Rng` so callers control determinism.
    pub fn sample(&self, rng: &mut impl Rng) -> Value {
        match self {
            Self::Array { dtype, shape } => {
                let n = shape.iter().product();
                Value::Leaf(match dtype {
                    ElementType::Bool => Tensor::from_bool(
                        shape.clone(),
                        (0..n).map(|_| rng.gen_bool(0.5)).collect(),
                    ),
                    ElementType::Int => Tensor::from_i64(
                        shape.clone(),
                        (0..n).map(|_| rng.gen_range(0..=1)).collect(),
                    ),
                    ElementType::Float => Tensor::from_f32(
                        shape.clone(),
                        (0..n).map(|_| rng.gen::<f32>()).collect(),
                    ),
                })
            }
            Self::BoundedArray {
                dtype,
                shape,
                minimum,
                maximum,
            } => {
                let n = shape.iter().product();
                Value::Leaf(match dtype {
                    ElementType::Bool => Tensor::from_bool(
                        shape.clone(),
                        (0..n).map(|_| rng.gen_bool(0.5)).collect(),
                    ),
                    #[allow(clippy::cast_possible_truncation)]
                    ElementType::Int => Tensor::from_i64(
                        shape.clone(),
                        (0..n)
                            .map(|_| rng.gen_range(minimum.ceil() as i64..=maximum.floor() as i64))
                            .collect(),
                    ),
                    #[allow(clippy::cast_possible_truncation)]
                    ElementType::Float => Tensor::from_f32(
                        shape.clone(),
                        (0..n)
                            .map(|_| rng.gen_range(*minimum as f32..=*maximum as f32))
                            .collect(),
                    ),
                })
            }
            Self::Discrete { num_values } => {
                Value::scalar_i64(rng.gen_range(0..*num_values))
            }
            Self::Tuple(children) => {
                Value::Tuple(children.iter().map(|c| c.sample(rng)).collect())
            }
            Self::Dict(children) => Value::Dict(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.sample(rng)))
                    .collect(),
            ),
        }
    }
}

fn expect_leaf<'v>(value: &'v Value, path: &str) -> Result<&'v Tensor, SpecError> {
    value.as_leaf().ok_or(SpecError::StructureMismatch {
        path: path.into(),
        expected: "leaf",
    })
}

fn check_layout(
    tensor: &Tensor,
    dtype: ElementType,
    shape: &[usize],
    path: &str,
) -> Result<(), SpecError> {
    if tensor.dtype() != dtype {
        return Err(SpecError::DtypeMismatch {
            path: path.into(),
            expected: dtype,
            got: tensor.dtype(),
        });
    }
    if tensor.shape() != shape {
        return Err(SpecError::ShapeMismatch {
            path: path.into(),
            expected: shape.to_vec(),
            got: tensor.shape().to_vec(),
        });
    }
    Ok(())
}

fn check_bounds(tensor: &Tensor, minimum: f64, maximum: f64, path: &str) -> Result<(), SpecError> {
    for v in tensor.iter_as_f64() {
        if v < minimum || v > maximum || v.is_nan() {
            return Err(SpecError::OutOfBounds {
                path: path.into(),
                value: v,
                minimum,
                maximum,
            });
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn filled(dtype: ElementType, shape: Vec<usize>, fill: f64) -> Tensor {
    let n = shape.iter().product();
    match dtype {
        ElementType::Bool => Tensor::from_bool(shape, vec![fill != 0.0; n]),
        ElementType::Int => Tensor::from_i64(shape, vec![fill as i64; n]),
        ElementType::Float => Tensor::from_f32(shape, vec![fill as f32; n]),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn nested_spec() -> Spec {
        Spec::dict([
            ("board".to_string(), Spec::bounded_float(vec![2, 2], 0.0, 1.0)),
            ("turn".to_string(), Spec::discrete(4)),
            (
                "flags".to_string(),
                Spec::Tuple(vec![Spec::bools(vec![3]), Spec::float_scalar()]),
            ),
        ])
    }

    #[test]
    fn generated_value_validates() {
        let spec = nested_spec();
        let value = spec.generate_value();
        spec.validate(&value).unwrap();
    }

    #[test]
    fn sampled_value_validates() {
        let spec = nested_spec();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let value = spec.sample(&mut rng);
            spec.validate(&value).unwrap();
        }
    }

    #[test]
    fn generate_clamps_into_bounds() {
        let spec = Spec::bounded_float(vec![2], 0.25, 0.75);
        let value = spec.generate_value();
        assert_eq!(
            value.as_leaf().unwrap().as_f32s(),
            Some(&[0.25, 0.25][..])
        );
        spec.validate(&value).unwrap();
    }

    #[test]
    fn shape_mismatch_reports_path() {
        let spec = nested_spec();
        let mut value = spec.generate_value();
        if let Value::Dict(map) = &mut value {
            map.insert(
                "board".to_string(),
                Value::Leaf(Tensor::zeros(ElementType::Float, vec![3, 3])),
            );
        }
        match spec.validate(&value) {
            Err(SpecError::ShapeMismatch { path, .. }) => assert_eq!(path, "value.board"),
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn dtype_mismatch_detected() {
        let spec = Spec::float_scalar();
        let err = spec.validate(&Value::scalar_i64(1)).unwrap_err();
        assert!(matches!(err, SpecError::DtypeMismatch { .. }));
    }

    #[test]
    fn bounds_violation_reports_value() {
        let spec = Spec::unit_interval();
        match spec.validate(&Value::scalar_f32(1.5)) {
            Err(SpecError::OutOfBounds { value, maximum, .. }) => {
                assert!((value - 1.5).abs() < 1e-6);
                assert!((maximum - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("expected out-of-bounds, got {other:?}"),
        }
    }

    #[test]
    fn nan_rejected_by_bounds() {
        let spec = Spec::unit_interval();
        assert!(spec.validate(&Value::scalar_f32(f32::NAN)).is_err());
    }

    #[test]
    fn discrete_rejects_out_of_range() {
        let spec = Spec::discrete(3);
        spec.validate(&Value::scalar_i64(2)).unwrap();
        assert!(spec.validate(&Value::scalar_i64(3)).is_err());
        assert!(spec.validate(&Value::scalar_i64(-1)).is_err());
    }

    #[test]
    fn missing_and_unexpected_fields() {
        let spec = Spec::dict([("a".to_string(), Spec::float_scalar())]);
        let missing = Value::dict([]);
        assert!(matches!(
            spec.validate(&missing),
            Err(SpecError::MissingField { .. })
        ));

        let extra = Value::dict([
            ("a".to_string(), Value::scalar_f32(0.0)),
            ("b".to_string(), Value::scalar_f32(0.0)),
        ]);
        assert!(matches!(
            spec.validate(&extra),
            Err(SpecError::UnexpectedField { .. })
        ));
    }

    #[test]
    fn tuple_arity_checked() {
        let spec = Spec::Tuple(vec![Spec::float_scalar(), Spec::float_scalar()]);
        let short = Value::Tuple(vec![Value::scalar_f32(0.0)]);
        assert!(matches!(
            spec.validate(&short),
            Err(SpecError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn validation_is_pure() {
        let spec = nested_spec();
        let value = spec.generate_value();
        let spec_before = spec.clone();
        let value_before = value.clone();
        let _ = spec.validate(&value);
        assert_eq!(spec, spec_before);
        assert_eq!(value, value_before);
    }

    #[test]
    fn with_leading_dim_describes_stacked_values() {
        use crate::value::stack;

        let spec = nested_spec();
        let lanes = vec![spec.generate_value(), spec.generate_value()];
        let stacked = stack(&lanes).unwrap();
        spec.with_leading_dim(2).validate(&stacked).unwrap();
    }

    #[test]
    fn serde_roundtrip() {
        let spec = nested_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: Spec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
