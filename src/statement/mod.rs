//! Statement text handling: classification, placeholder scanning and call
//! statement synthesis.

mod builder;
mod parse;

pub use builder::build_call_statement;
pub use parse::{Placeholder, Statement, StatementType};
