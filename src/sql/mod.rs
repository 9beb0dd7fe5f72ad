//! The SQL front-end. A query string flows through the tokenizer, parser
//! and semantic validator before the executor applies it to the row store.
pub mod core;
pub mod db;
pub mod diagnostic;
pub mod execute;
pub mod parser;
pub mod semantic;
pub mod storage;
pub mod token;
pub mod tokenizer;
