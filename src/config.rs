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

//! Configuration that the coordinator broadcasts to every worker before (or
//! during) a solving session: timeout, verbosity, and log file, per the
//! `set-timeout` / `set-timeout-ms` / `set-verbosity` / `set-log-file`
//! opcodes of `spec.md` §6.3.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;

/// Per-session configuration, broadcast to all workers.
#[derive(Clone, Debug, Default, Builder)]
#[builder(default)]
pub struct SolverConfig {
    #[builder(setter(strip_option))]
    pub timeout: Option<Duration>,
    pub verbosity: u8,
    #[builder(setter(strip_option, into))]
    pub log_file: Option<PathBuf>,
}
