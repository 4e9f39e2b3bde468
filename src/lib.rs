//! `oas-codegen`: turns an OpenAPI 3.0.x/3.1.0 document into a compile-ready
//! Swift API surface — a protocol of operations, every referenced data
//! type, and either a client dispatching over a pluggable HTTP transport or
//! a server stub registering handlers on one.
//!
//! The pipeline is a pure transformation: parse → filter → validate →
//! translate → render. [`pipeline::run`] is the single entry point that
//! drives all five stages; everything else in this crate is a stage it
//! calls.

#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod document;
pub mod error;
pub mod filter;
pub mod graph;
pub mod ir;
pub mod naming;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod shard;
pub mod support;
pub mod translate;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticSink, FileSink, Severity, StreamSink, ThrowingSink};
pub use document::Document;
pub use error::{Error, Result};
pub use filter::FilterCriteria;
pub use naming::NamingStrategy;
pub use pipeline::{AccessLevel, Config, Mode, OutputFile};
