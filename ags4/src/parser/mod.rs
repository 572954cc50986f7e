//! Parsers AGS : tokenisation CSV puis machine à états par groupe

pub mod group;
pub mod tokenizer;

pub use group::{parse_all, parse_group};
