//! Core XML parsing primitives
//!
//! This module contains the building blocks of the tokenizer:
//! - Scanner: streaming buffer with memchr delimiter search and line/column tracking
//! - Tokenizer: state machine for XML event extraction
//! - Entities: reference decoding (Cow, zero-copy when possible) and output escaping
//! - Attributes: start-tag attribute parsing
//! - Encoding: charset selection and transcoding to UTF-8

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
