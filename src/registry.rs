//! The function registry: resolves a `Call` expression's name to an
//! implementation. Registry functions evaluate their own arguments (lazy
//! allowed) so that higher-order functions can inject the context.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::arithmetic;
use crate::error::EvalError;
use crate::evaluator::{evaluate, BoxFuture, EvaluationContext, Expression};
use crate::group::{self, Reducer};
use crate::series::SeriesList;
use crate::transforms;
use crate::value::Value;

/// One builtin's implementation: receives its own unevaluated argument
/// expressions plus an optional `group_by` tag list, and evaluates whatever
/// it needs from `ctx`.
pub type BuiltinFn = for<'a> fn(&'a [Expression], Option<&'a [String]>, &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>>;

static UNARY_OPS: Lazy<HashMap<&'static str, fn(f64) -> f64>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, fn(f64) -> f64> = HashMap::new();
    m.insert("abs", f64::abs);
    m.insert("negate", |v| -v);
    m.insert("sqrt", f64::sqrt);
    m.insert("square", |v| v * v);
    m
});

fn apply_per_series(list: &SeriesList, f: impl Fn(&crate::series::Timeseries) -> crate::series::Timeseries) -> SeriesList {
    let series = list.series.iter().map(f).collect();
    SeriesList::new(series, list.timerange, list.name.clone())
}

async fn first_arg_series_list<'a>(args: &'a [Expression], ctx: &'a EvaluationContext) -> Result<SeriesList, EvalError> {
    let arg = args.first().ok_or_else(|| EvalError::SyntaxError("expected at least one argument".to_string()))?;
    let value = evaluate(arg, ctx).await?;
    value.to_series_list(&ctx.timerange)
}

async fn call_aggregate(
    args: &[Expression],
    group_by: Option<&[String]>,
    ctx: &EvaluationContext,
    reducer: Reducer,
) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    let tags = group_by.ok_or_else(|| EvalError::SyntaxError("aggregation requires a group_by clause".to_string()))?;
    Ok(Value::SeriesList(group::aggregate(&list, reducer, tags)))
}

fn sum_fn<'a>(args: &'a [Expression], group_by: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_aggregate(args, group_by, ctx, Reducer::Sum))
}
fn mean_fn<'a>(args: &'a [Expression], group_by: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_aggregate(args, group_by, ctx, Reducer::Mean))
}
fn min_fn<'a>(args: &'a [Expression], group_by: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_aggregate(args, group_by, ctx, Reducer::Min))
}
fn max_fn<'a>(args: &'a [Expression], group_by: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_aggregate(args, group_by, ctx, Reducer::Max))
}

async fn call_derivative(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    let resolution = list.timerange.resolution_ms();
    Ok(Value::SeriesList(apply_per_series(&list, |s| transforms::derivative(s, resolution))))
}
fn derivative_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_derivative(args, ctx))
}

async fn call_rate(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    let resolution = list.timerange.resolution_ms();
    Ok(Value::SeriesList(apply_per_series(&list, |s| transforms::rate(s, resolution))))
}
fn rate_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_rate(args, ctx))
}

async fn call_integral(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    let resolution = list.timerange.resolution_ms();
    Ok(Value::SeriesList(apply_per_series(&list, |s| transforms::integral(s, resolution))))
}
fn integral_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_integral(args, ctx))
}

async fn call_cumulative(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    Ok(Value::SeriesList(apply_per_series(&list, transforms::cumulative)))
}
fn cumulative_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_cumulative(args, ctx))
}

async fn call_default(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    let default_arg = args.get(1).ok_or_else(|| EvalError::SyntaxError("default(series, value) requires 2 arguments".to_string()))?;
    let d = evaluate(default_arg, ctx).await?.to_scalar()?;
    Ok(Value::SeriesList(apply_per_series(&list, |s| transforms::default(s, d))))
}
fn default_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_default(args, ctx))
}

async fn call_keep_last(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    Ok(Value::SeriesList(apply_per_series(&list, transforms::keep_last)))
}
fn keep_last_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_keep_last(args, ctx))
}

async fn call_map(args: &[Expression], ctx: &EvaluationContext) -> Result<Value, EvalError> {
    let list = first_arg_series_list(args, ctx).await?;
    let op_arg = args.get(1).ok_or_else(|| EvalError::SyntaxError("map(series, op) requires 2 arguments".to_string()))?;
    let op_name = evaluate(op_arg, ctx).await?;
    let op_name = op_name.to_string_value()?;
    let op = UNARY_OPS.get(op_name).ok_or_else(|| EvalError::SyntaxError(format!("unknown map operator '{op_name}'")))?;
    Ok(Value::SeriesList(apply_per_series(&list, |s| transforms::map(s, *op))))
}
fn map_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_map(args, ctx))
}

async fn call_binop(args: &[Expression], ctx: &EvaluationContext, f: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    let left = args.first().ok_or_else(|| EvalError::SyntaxError("binary op requires 2 arguments".to_string()))?;
    let right = args.get(1).ok_or_else(|| EvalError::SyntaxError("binary op requires 2 arguments".to_string()))?;
    let left = evaluate(left, ctx).await?.to_series_list(&ctx.timerange)?;
    let right = evaluate(right, ctx).await?.to_series_list(&ctx.timerange)?;
    Ok(Value::SeriesList(arithmetic::binop(f, &left, &right)))
}
fn add_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_binop(args, ctx, |a, b| a + b))
}
fn subtract_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_binop(args, ctx, |a, b| a - b))
}
fn multiply_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_binop(args, ctx, |a, b| a * b))
}
fn divide_fn<'a>(args: &'a [Expression], _g: Option<&'a [String]>, ctx: &'a EvaluationContext) -> BoxFuture<'a, Result<Value, EvalError>> {
    Box::pin(call_binop(args, ctx, |a, b| a / b))
}

/// An immutable, shareable table of builtin functions.
pub struct FunctionRegistry {
    functions: HashMap<&'static str, BuiltinFn>,
}

impl FunctionRegistry {
    pub fn builtin() -> Self {
        let mut functions: HashMap<&'static str, BuiltinFn> = HashMap::new();
        functions.insert("sum", sum_fn);
        functions.insert("mean", mean_fn);
        functions.insert("min", min_fn);
        functions.insert("max", max_fn);
        functions.insert("derivative", derivative_fn);
        functions.insert("rate", rate_fn);
        functions.insert("integral", integral_fn);
        functions.insert("cumulative", cumulative_fn);
        functions.insert("default", default_fn);
        functions.insert("keep_last", keep_last_fn);
        functions.insert("map", map_fn);
        functions.insert("add", add_fn);
        functions.insert("subtract", subtract_fn);
        functions.insert("multiply", multiply_fn);
        functions.insert("divide", divide_fn);
        FunctionRegistry { functions }
    }

    pub fn lookup(&self, name: &str) -> Option<BuiltinFn> {
        self.functions.get(name).copied()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
