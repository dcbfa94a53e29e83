//! # UQL - Abstract Syntax Tree
//!
//! A query is a pipeline of stages separated by `|`. Each stage receives the
//! value produced by the previous one and hands a new value to the next.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[stages]** - Pipeline stages and the items they carry
//! - **[options]** - Options for the `parse-csv` and `parse-xml` stages
//!
//! ## Quick Start
//!
//! ```text
//! parse-json
//! | scope "data.users"
//! | project "name", "city"="address.city"
//! | order by "name" asc
//! ```
//!
//! ## Core Concepts
//!
//! ### Field references vs strings
//!
//! Double quotes name a field path (`"address.city"`), single quotes are
//! string literals (`' '`). This matters inside function calls:
//!
//! ```text
//! extend "full_name"=strcat("first",' ',"last")
//! ```
//!
//! ### Shape-dependent stages
//!
//! Most stages look at the shape of the incoming value. `count` returns the
//! length of an array or a string and leaves numbers and objects alone; `limit`
//! truncates arrays and strings. A stage that does not apply to the value it
//! receives passes it through unchanged.
//!
//! ## Examples
//!
//! ### Grouping
//!
//! ```text
//! parse-json | summarize "n"=count(), "total"=sum("amount") by "team"
//! ```
//!
//! ### Expanding arrays
//!
//! ```text
//! parse-json | mv-expand "tag"="tags" | project "id", "tag"
//! ```
pub mod options;
pub mod stages;
pub mod tokens;

pub use options::{CsvOptions, XmlOptions};
pub use stages::{Direction, FunctionArg, Metric, OrderField, ProjectItem, Stage};
pub use tokens::Token;
