// Copyright (c) 2024 The Parcoord Authors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Shared parameter-list encodings for the handful of opcodes whose payload
//! shape is richer than a single scalar. Kept in one place so the
//! coordinator-side [`crate::implementation::remote::RemoteSolverProxy`] and
//! the worker-side [`crate::implementation::dispatcher::WorkerDispatcher`]
//! can't drift apart on what a given opcode's parameters mean.

use fxhash::FxHashMap;
use num_bigint::BigInt;

use crate::common::{Assumption, Bound, Cube, Relation, VariableId};
use crate::error::{CoreError, CoreResult};
use crate::implementation::message::Parameter;

pub fn int(v: i64) -> Parameter {
    Parameter::Int(v)
}

pub fn big(v: &BigInt) -> Parameter {
    Parameter::Big(v.clone())
}

pub fn text(v: impl Into<String>) -> Parameter {
    Parameter::Str(v.into())
}

pub fn as_int(params: &[Parameter], index: usize) -> CoreResult<i64> {
    match params.get(index) {
        Some(Parameter::Int(v)) => Ok(*v),
        _ => Err(CoreError::protocol(format!("expected an int parameter at index {index}"))),
    }
}

pub fn as_big(params: &[Parameter], index: usize) -> CoreResult<BigInt> {
    match params.get(index) {
        Some(Parameter::Big(v)) => Ok(v.clone()),
        _ => Err(CoreError::protocol(format!("expected a big-integer parameter at index {index}"))),
    }
}

pub fn as_str(params: &[Parameter], index: usize) -> CoreResult<&str> {
    match params.get(index) {
        Some(Parameter::Str(v)) => Ok(v.as_str()),
        _ => Err(CoreError::protocol(format!("expected a string parameter at index {index}"))),
    }
}

pub fn as_bool(params: &[Parameter], index: usize) -> CoreResult<bool> {
    match params.get(index) {
        Some(Parameter::Bool(v)) => Ok(*v),
        _ => Err(CoreError::protocol(format!("expected a bool parameter at index {index}"))),
    }
}

/// Encodes a [`Cube`] as `[count, (varId, relationFlag, value)...]`.
pub fn encode_cube(cube: &Cube) -> Vec<Parameter> {
    let mut params = vec![int(cube.assumptions().len() as i64)];
    for assumption in cube.assumptions() {
        params.push(int(assumption.variable.id() as i64));
        params.push(Parameter::Bool(matches!(assumption.relation, Relation::Equal)));
        params.push(big(&assumption.value));
    }
    params
}

pub fn decode_cube(params: &[Parameter]) -> CoreResult<Cube> {
    let count = as_int(params, 0)? as usize;
    let mut assumptions = Vec::with_capacity(count);
    for i in 0..count {
        let base = 1 + i * 3;
        let variable = VariableId(as_int(params, base)? as usize);
        let relation = if as_bool(params, base + 1)? { Relation::Equal } else { Relation::NotEqual };
        let value = as_big(params, base + 2)?;
        assumptions.push(Assumption { variable, relation, value });
    }
    Ok(Cube::from(assumptions))
}

/// Encodes `(lower, upper)` variable/value lists as used by
/// `set_decision_variables` (values list left empty) and
/// `set_value_heuristic_static`.
pub fn encode_variable_value_lists(variables: &[VariableId], values: &[BigInt]) -> Vec<Parameter> {
    let mut params = vec![int(variables.len() as i64), int(values.len() as i64)];
    params.extend(variables.iter().map(|v| int(v.id() as i64)));
    params.extend(values.iter().map(big));
    params
}

pub fn decode_variable_value_lists(params: &[Parameter]) -> CoreResult<(Vec<VariableId>, Vec<BigInt>)> {
    let n_vars = as_int(params, 0)? as usize;
    let n_vals = as_int(params, 1)? as usize;
    let mut variables = Vec::with_capacity(n_vars);
    for i in 0..n_vars {
        variables.push(VariableId(as_int(params, 2 + i)? as usize));
    }
    let mut values = Vec::with_capacity(n_vals);
    for i in 0..n_vals {
        values.push(as_big(params, 2 + n_vars + i)?);
    }
    Ok((variables, values))
}

/// Encodes a solution vector as `[count, value...]`.
pub fn encode_solution(values: &[BigInt]) -> Vec<Parameter> {
    let mut params = vec![int(values.len() as i64)];
    params.extend(values.iter().map(big));
    params
}

pub fn decode_solution(params: &[Parameter]) -> CoreResult<Vec<BigInt>> {
    let count = as_int(params, 0)? as usize;
    (0..count).map(|i| as_big(params, 1 + i)).collect()
}

/// Encodes a name-keyed assignment as `[count, (name, value)...]`.
pub fn encode_mapping(mapping: &FxHashMap<String, BigInt>) -> Vec<Parameter> {
    let mut params = vec![int(mapping.len() as i64)];
    for (name, value) in mapping {
        params.push(text(name.clone()));
        params.push(big(value));
    }
    params
}

pub fn decode_mapping(params: &[Parameter]) -> CoreResult<FxHashMap<String, BigInt>> {
    let count = as_int(params, 0)? as usize;
    let mut map = FxHashMap::with_capacity_and_hasher(count, Default::default());
    for i in 0..count {
        let base = 1 + i * 2;
        let name = as_str(params, base)?.to_owned();
        let value = as_big(params, base + 1)?;
        map.insert(name, value);
    }
    Ok(map)
}

pub fn bound_param(bound: &Bound) -> Parameter {
    big(bound.value())
}

pub fn bound_from(params: &[Parameter], index: usize) -> CoreResult<Bound> {
    Ok(Bound::new(as_big(params, index)?))
}
