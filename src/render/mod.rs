//! Renderer (spec.md §4.9): walks IR declarations and produces formatted
//! Swift source text. Idempotent — rendering the same IR twice yields
//! byte-identical output, since the writer carries no hidden state beyond
//! indentation depth.

pub mod swift;

pub use swift::render_file;
