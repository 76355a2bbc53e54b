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

//! The wire message format (`spec.md` §4.2, §6.3): a fixed header followed
//! by a typed parameter stream. `Message` is the in-memory representation
//! every [`crate::abstraction::transport::Transport`] moves around;
//! `encode`/`decode` turn it into the byte layout the header describes, for
//! transports that actually need bytes on a wire (an in-process transport
//! may choose to move `Message` values directly and skip the round trip,
//! see [`crate::implementation::transport::thread::ThreadTransport`]).

use std::str::FromStr;

use num_bigint::BigInt;

use crate::error::{CoreError, CoreResult};

/// Groups message kinds for filtered receive, per `spec.md` §4.2.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Tag {
    /// Solve-lifecycle traffic, both ways.
    Solve,
    /// Reply to an interrogation RPC.
    Response,
    /// Configuration side-effects.
    Config,
}

impl Tag {
    fn as_byte(self) -> u8 {
        match self {
            Tag::Solve => 0,
            Tag::Response => 1,
            Tag::Config => 2,
        }
    }

    fn from_byte(b: u8) -> CoreResult<Tag> {
        match b {
            0 => Ok(Tag::Solve),
            1 => Ok(Tag::Response),
            2 => Ok(Tag::Config),
            other => Err(CoreError::protocol(format!("unknown tag byte {other}"))),
        }
    }
}

/// The compact set of wire opcodes from `spec.md` §6.3. Each maps to a
/// 3-byte ASCII name (shorter names are not padded on the wire; `as_code`
/// returns exactly the bytes the original name specifies).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Opcode {
    // operational
    AssignIndex,
    LoadInstance,
    Reset,
    Solve,
    SolveFile,
    SolveAssumptions,
    Interrupt,
    EndSearch,
    // terminal
    Satisfiable,
    Unsatisfiable,
    OptimumFound,
    Unknown,
    Unsupported,
    NewBoundFound,
    // configuration
    SetTimeout,
    SetTimeoutMs,
    SetVerbosity,
    SetLogFile,
    SetLogStream,
    SetLowerBound,
    SetUpperBound,
    SetLowerUpperBound,
    SetDecisionVariables,
    SetValueHeuristicStatic,
    // interrogation (RPC)
    NVariables,
    NConstraints,
    IsOptimization,
    IsMinimization,
    GetLowerBound,
    GetUpperBound,
    GetCurrentBound,
    Solution,
    MapSolution,
    AuxiliaryVariables,
    CheckSolution,
    CheckSolutionAssignment,
}

impl Opcode {
    pub fn as_code(self) -> &'static str {
        match self {
            Opcode::AssignIndex => "idx",
            Opcode::LoadInstance => "lod",
            Opcode::Reset => "rst",
            Opcode::Solve => "s",
            Opcode::SolveFile => "sf",
            Opcode::SolveAssumptions => "sa",
            Opcode::Interrupt => "i",
            Opcode::EndSearch => "end",
            Opcode::Satisfiable => "sat",
            Opcode::Unsatisfiable => "ust",
            Opcode::OptimumFound => "opt",
            Opcode::Unknown => "unk",
            Opcode::Unsupported => "usp",
            Opcode::NewBoundFound => "bnd",
            Opcode::SetTimeout => "t",
            Opcode::SetTimeoutMs => "tm",
            Opcode::SetVerbosity => "v",
            Opcode::SetLogFile => "log",
            Opcode::SetLogStream => "lgs",
            Opcode::SetLowerBound => "low",
            Opcode::SetUpperBound => "upp",
            Opcode::SetLowerUpperBound => "lub",
            Opcode::SetDecisionVariables => "dec",
            Opcode::SetValueHeuristicStatic => "vhs",
            Opcode::NVariables => "nv",
            Opcode::NConstraints => "nc",
            Opcode::IsOptimization => "op?",
            Opcode::IsMinimization => "min",
            Opcode::GetLowerBound => "lb?",
            Opcode::GetUpperBound => "ub?",
            Opcode::GetCurrentBound => "cur",
            Opcode::Solution => "sol",
            Opcode::MapSolution => "map",
            Opcode::AuxiliaryVariables => "aux",
            Opcode::CheckSolution => "chk",
            Opcode::CheckSolutionAssignment => "cka",
        }
    }

    pub fn from_code(code: &str) -> CoreResult<Opcode> {
        Ok(match code {
            "idx" => Opcode::AssignIndex,
            "lod" => Opcode::LoadInstance,
            "rst" => Opcode::Reset,
            "s" => Opcode::Solve,
            "sf" => Opcode::SolveFile,
            "sa" => Opcode::SolveAssumptions,
            "i" => Opcode::Interrupt,
            "end" => Opcode::EndSearch,
            "sat" => Opcode::Satisfiable,
            "ust" => Opcode::Unsatisfiable,
            "opt" => Opcode::OptimumFound,
            "unk" => Opcode::Unknown,
            "usp" => Opcode::Unsupported,
            "bnd" => Opcode::NewBoundFound,
            "t" => Opcode::SetTimeout,
            "tm" => Opcode::SetTimeoutMs,
            "v" => Opcode::SetVerbosity,
            "log" => Opcode::SetLogFile,
            "lgs" => Opcode::SetLogStream,
            "low" => Opcode::SetLowerBound,
            "upp" => Opcode::SetUpperBound,
            "lub" => Opcode::SetLowerUpperBound,
            "dec" => Opcode::SetDecisionVariables,
            "vhs" => Opcode::SetValueHeuristicStatic,
            "nv" => Opcode::NVariables,
            "nc" => Opcode::NConstraints,
            "op?" => Opcode::IsOptimization,
            "min" => Opcode::IsMinimization,
            "lb?" => Opcode::GetLowerBound,
            "ub?" => Opcode::GetUpperBound,
            "cur" => Opcode::GetCurrentBound,
            "sol" => Opcode::Solution,
            "map" => Opcode::MapSolution,
            "aux" => Opcode::AuxiliaryVariables,
            "chk" => Opcode::CheckSolution,
            "cka" => Opcode::CheckSolutionAssignment,
            other => return Err(CoreError::protocol(format!("unknown opcode {other:?}"))),
        })
    }
}

/// One packed parameter in a message's payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Parameter {
    Int(i64),
    Big(BigInt),
    Str(String),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl Parameter {
    fn type_tag(&self) -> u8 {
        match self {
            Parameter::Int(_) => 0,
            Parameter::Big(_) => 1,
            Parameter::Str(_) => 2,
            Parameter::Bool(_) => 3,
            Parameter::Bytes(_) => 4,
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.type_tag());
        match self {
            Parameter::Int(v) => buf.extend_from_slice(&v.to_ne_bytes()),
            Parameter::Big(v) => {
                buf.extend_from_slice(v.to_str_radix(10).as_bytes());
                buf.push(0);
            }
            Parameter::Str(v) => {
                buf.extend_from_slice(v.as_bytes());
                buf.push(0);
            }
            Parameter::Bool(v) => buf.push(if *v { 1 } else { 0 }),
            Parameter::Bytes(v) => {
                buf.extend_from_slice(&(v.len() as u32).to_ne_bytes());
                buf.extend_from_slice(v);
            }
        }
    }

    fn decode_from(buf: &[u8], cursor: &mut usize) -> CoreResult<Parameter> {
        let type_tag = *buf.get(*cursor).ok_or_else(|| CoreError::protocol("truncated parameter"))?;
        *cursor += 1;
        match type_tag {
            0 => {
                let bytes: [u8; 8] = buf
                    .get(*cursor..*cursor + 8)
                    .ok_or_else(|| CoreError::protocol("truncated int parameter"))?
                    .try_into()
                    .unwrap();
                *cursor += 8;
                Ok(Parameter::Int(i64::from_ne_bytes(bytes)))
            }
            1 => {
                let nul = find_nul(buf, *cursor)?;
                let text = std::str::from_utf8(&buf[*cursor..nul])
                    .map_err(|_| CoreError::protocol("non-utf8 big integer parameter"))?;
                let value = BigInt::from_str(text)
                    .map_err(|_| CoreError::protocol("malformed big integer parameter"))?;
                *cursor = nul + 1;
                Ok(Parameter::Big(value))
            }
            2 => {
                let nul = find_nul(buf, *cursor)?;
                let text = std::str::from_utf8(&buf[*cursor..nul])
                    .map_err(|_| CoreError::protocol("non-utf8 string parameter"))?
                    .to_owned();
                *cursor = nul + 1;
                Ok(Parameter::Str(text))
            }
            3 => {
                let b = *buf.get(*cursor).ok_or_else(|| CoreError::protocol("truncated bool parameter"))?;
                *cursor += 1;
                Ok(Parameter::Bool(b != 0))
            }
            4 => {
                let len_bytes: [u8; 4] = buf
                    .get(*cursor..*cursor + 4)
                    .ok_or_else(|| CoreError::protocol("truncated bytes length"))?
                    .try_into()
                    .unwrap();
                let len = u32::from_ne_bytes(len_bytes) as usize;
                *cursor += 4;
                let data = buf
                    .get(*cursor..*cursor + len)
                    .ok_or_else(|| CoreError::protocol("truncated bytes parameter"))?
                    .to_vec();
                *cursor += len;
                Ok(Parameter::Bytes(data))
            }
            other => Err(CoreError::protocol(format!("unknown parameter type tag {other}"))),
        }
    }
}

fn find_nul(buf: &[u8], from: usize) -> CoreResult<usize> {
    buf[from..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| from + i)
        .ok_or_else(|| CoreError::protocol("missing NUL terminator"))
}

/// A single framed message: `{ tag, opcode, source, parameters }`, per
/// `spec.md` §4.2 (the `name` field of the spec is [`Opcode::as_code`]; the
/// header's `parameterCount`/`payloadSize` are recomputed by `encode` and
/// validated by `decode`).
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub tag: Tag,
    pub opcode: Opcode,
    pub source: usize,
    pub parameters: Vec<Parameter>,
}

impl Message {
    pub fn new(tag: Tag, opcode: Opcode, source: usize, parameters: Vec<Parameter>) -> Self {
        Message { tag, opcode, source, parameters }
    }

    /// Encodes this message as `{ tag, name, source, parameterCount,
    /// payloadSize, payload }`, per `spec.md` §4.2.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for param in &self.parameters {
            param.encode_into(&mut payload);
        }

        let name = self.opcode.as_code();
        let mut buf = Vec::with_capacity(1 + 1 + name.len() + 8 + 4 + 4 + payload.len());
        buf.push(self.tag.as_byte());
        buf.push(name.len() as u8);
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&(self.source as u64).to_ne_bytes());
        buf.extend_from_slice(&(self.parameters.len() as u32).to_ne_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_ne_bytes());
        buf.extend_from_slice(&payload);
        buf
    }

    /// Decodes a message previously produced by [`Message::encode`]. Readers
    /// must not consume past the declared `payloadSize`; this function
    /// enforces that by treating a short buffer as a protocol error rather
    /// than panicking.
    pub fn decode(buf: &[u8]) -> CoreResult<Message> {
        let mut cursor = 0usize;
        let tag = Tag::from_byte(*buf.get(cursor).ok_or_else(|| CoreError::protocol("empty message"))?)?;
        cursor += 1;

        let name_len = *buf.get(cursor).ok_or_else(|| CoreError::protocol("truncated header"))? as usize;
        cursor += 1;
        let name_bytes = buf
            .get(cursor..cursor + name_len)
            .ok_or_else(|| CoreError::protocol("truncated opcode name"))?;
        let name = std::str::from_utf8(name_bytes).map_err(|_| CoreError::protocol("non-ascii opcode name"))?;
        let opcode = Opcode::from_code(name)?;
        cursor += name_len;

        let source_bytes: [u8; 8] = buf
            .get(cursor..cursor + 8)
            .ok_or_else(|| CoreError::protocol("truncated source"))?
            .try_into()
            .unwrap();
        let source = u64::from_ne_bytes(source_bytes) as usize;
        cursor += 8;

        let param_count_bytes: [u8; 4] = buf
            .get(cursor..cursor + 4)
            .ok_or_else(|| CoreError::protocol("truncated parameter count"))?
            .try_into()
            .unwrap();
        let param_count = u32::from_ne_bytes(param_count_bytes) as usize;
        cursor += 4;

        let payload_size_bytes: [u8; 4] = buf
            .get(cursor..cursor + 4)
            .ok_or_else(|| CoreError::protocol("truncated payload size"))?
            .try_into()
            .unwrap();
        let payload_size = u32::from_ne_bytes(payload_size_bytes) as usize;
        cursor += 4;

        let payload = buf
            .get(cursor..cursor + payload_size)
            .ok_or_else(|| CoreError::protocol("payload shorter than declared size"))?;

        let mut payload_cursor = 0usize;
        let mut parameters = Vec::with_capacity(param_count);
        for _ in 0..param_count {
            parameters.push(Parameter::decode_from(payload, &mut payload_cursor)?);
        }
        if payload_cursor != payload.len() {
            return Err(CoreError::protocol("trailing bytes after declared parameter count"));
        }

        Ok(Message { tag, opcode, source, parameters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_parameter_kind() {
        let msg = Message::new(
            Tag::Solve,
            Opcode::NewBoundFound,
            3,
            vec![
                Parameter::Int(-7),
                Parameter::Big(BigInt::from(123_456_789_i64)),
                Parameter::Str("hello".into()),
                Parameter::Bool(true),
                Parameter::Bytes(vec![1, 2, 3, 4]),
            ],
        );
        let bytes = msg.encode();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn rejects_truncated_payload() {
        let msg = Message::new(Tag::Config, Opcode::SetTimeout, 0, vec![Parameter::Int(30)]);
        let mut bytes = msg.encode();
        bytes.truncate(bytes.len() - 2);
        assert!(Message::decode(&bytes).is_err());
    }

    #[test]
    fn opcode_round_trips_through_its_3_byte_code() {
        for opcode in [
            Opcode::AssignIndex, Opcode::LoadInstance, Opcode::Reset, Opcode::Solve, Opcode::SolveFile,
            Opcode::SolveAssumptions, Opcode::Interrupt, Opcode::EndSearch, Opcode::Satisfiable,
            Opcode::Unsatisfiable, Opcode::OptimumFound, Opcode::Unknown, Opcode::Unsupported,
            Opcode::NewBoundFound, Opcode::SetTimeout, Opcode::SetTimeoutMs, Opcode::SetVerbosity,
            Opcode::SetLogFile, Opcode::SetLogStream, Opcode::SetLowerBound, Opcode::SetUpperBound,
            Opcode::SetLowerUpperBound, Opcode::SetDecisionVariables, Opcode::SetValueHeuristicStatic,
            Opcode::NVariables, Opcode::NConstraints, Opcode::IsOptimization, Opcode::IsMinimization,
            Opcode::GetLowerBound, Opcode::GetUpperBound, Opcode::GetCurrentBound, Opcode::Solution,
            Opcode::MapSolution, Opcode::AuxiliaryVariables, Opcode::CheckSolution,
            Opcode::CheckSolutionAssignment,
        ] {
            assert!(opcode.as_code().len() <= 3);
            assert_eq!(Opcode::from_code(opcode.as_code()).unwrap(), opcode);
        }
    }
}
