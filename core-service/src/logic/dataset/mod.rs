//! Dataset Module - JSONL training data
//!
//! One flat JSON object per line. Written by `sentinel generate`, read
//! back by training runs.

pub mod writer;


pub use writer::{read_jsonl, DatasetWriter};
