//! Listing for `uql functions`

use crate::functions::{Arity, Operator};

/// The function registry as a table: name, arguments, description.
pub fn functions_overview() -> String {
    let mut out = String::from("UQL FUNCTIONS\n\n");
    for op in Operator::all() {
        let args = match op.arity() {
            Arity::Zero => "()",
            Arity::Unary => "(x)",
            Arity::Binary => "(a, b)",
            Arity::Variadic => "(...)",
        };
        let signature = format!("{}{}", op.name(), args);
        out.push_str(&format!("  {:<18}{}\n", signature, op.description()));
    }
    out.push_str(concat!(
        "\nFunctions are called inside extend, project and summarize, or used alone as a stage:\n\n",
        "  summarize \"total\"=sum(\"price\") by \"team\"\n",
        "  echo 'abc' | toupper\n",
    ));
    out
}
