//! The value lattice: a tagged variant over the four result shapes a query
//! can produce, with total coercion functions rather than dynamic dispatch.
//! Extend by adding a variant, not a subclass.

use crate::error::EvalError;
use crate::series::{SeriesList, Timeseries};
use crate::tagset::TagSet;
use crate::timerange::Timerange;

/// The one result type every expression in the evaluator produces.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(f64),
    Duration(i64),
    String(String),
    SeriesList(SeriesList),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Duration(_) => "duration",
            Value::String(_) => "string",
            Value::SeriesList(_) => "series_list",
        }
    }

    pub fn to_scalar(&self) -> Result<f64, EvalError> {
        match self {
            Value::Scalar(v) => Ok(*v),
            other => Err(EvalError::TypeMismatch { expected: "scalar", got: other.type_name() }),
        }
    }

    pub fn to_duration(&self) -> Result<i64, EvalError> {
        match self {
            Value::Duration(v) => Ok(*v),
            other => Err(EvalError::TypeMismatch { expected: "duration", got: other.type_name() }),
        }
    }

    pub fn to_string_value(&self) -> Result<&str, EvalError> {
        match self {
            Value::String(v) => Ok(v.as_str()),
            other => Err(EvalError::TypeMismatch { expected: "string", got: other.type_name() }),
        }
    }

    /// Coerce to a [`SeriesList`] over `timerange`. A scalar broadcasts to a
    /// single constant series with an empty tag set; an existing series list
    /// passes through provided its timerange is resolution-compatible.
    pub fn to_series_list(&self, timerange: &Timerange) -> Result<SeriesList, EvalError> {
        match self {
            Value::Scalar(v) => {
                let series = Timeseries::new(vec![*v; timerange.slots()], TagSet::new());
                Ok(SeriesList::new(vec![series], *timerange, "scalar"))
            }
            Value::SeriesList(list) => {
                if !list.timerange.is_compatible(timerange) {
                    return Err(EvalError::TypeMismatch { expected: "series_list", got: "series_list (incompatible timerange)" });
                }
                Ok(list.clone())
            }
            other => Err(EvalError::TypeMismatch { expected: "series_list", got: other.type_name() }),
        }
    }
}
