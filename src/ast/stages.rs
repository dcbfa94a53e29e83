use crate::ast::{CsvOptions, XmlOptions};
use crate::functions::Operator;
use crate::value::Value;

/// Pipeline stage.
///
/// A query is a sequence of stages; each one consumes the previous stage's
/// value and produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Comment, passes the value through
    ///
    /// # Example
    /// ```text
    /// # only active users
    /// ```
    Comment(String),

    /// Replaces the value with `"hello"`
    Hello,

    /// Replaces the value with a literal (`"pong"` when none is given)
    ///
    /// # Example
    /// ```text
    /// ping
    /// ```
    Ping(Value),

    /// Replaces the value with a literal
    ///
    /// # Example
    /// ```text
    /// echo 'hi there'
    /// ```
    Echo(Value),

    /// Narrows the value to a nested field
    ///
    /// # Example
    /// ```text
    /// scope "data.items"
    /// ```
    Scope(String),

    /// Evaluates an expression of the secondary expression language
    ///
    /// # Example
    /// ```text
    /// jsonata "items[price > 10].name"
    /// ```
    Expression(String),

    /// Removes duplicates, optionally after projecting a field
    ///
    /// # Example
    /// ```text
    /// distinct "country"
    /// ```
    Distinct(Option<String>),

    /// Expands an array field into one row per item
    ///
    /// # Examples
    /// ```text
    /// mv-expand "tags"
    /// mv-expand "tag"="tags"
    /// ```
    MvExpand {
        field: String,
        alias: Option<String>,
    },

    /// Length of an array or string
    Count,

    /// Keeps the first `n` elements or characters
    ///
    /// # Example
    /// ```text
    /// limit 10
    /// ```
    Limit(usize),

    /// Applies a registry operator to the whole value
    ///
    /// # Examples
    /// ```text
    /// sum
    /// toupper
    /// ```
    Command(Operator),

    /// Stable multi-key sort
    ///
    /// # Example
    /// ```text
    /// order by "age" desc, "name"
    /// ```
    OrderBy(Vec<OrderField>),

    /// Adds fields to every row
    ///
    /// # Example
    /// ```text
    /// extend "name"=toupper("name"), "total"=sum("a","b")
    /// ```
    Extend(Vec<ProjectItem>),

    /// Builds new rows holding only the listed fields
    ///
    /// # Example
    /// ```text
    /// project "id", "city"="address.city"
    /// ```
    Project(Vec<ProjectItem>),

    /// Removes fields from every row
    ///
    /// # Example
    /// ```text
    /// project-away "password", "token"
    /// ```
    ProjectAway(Vec<String>),

    /// Groups rows and computes metrics per group
    ///
    /// # Example
    /// ```text
    /// summarize "n"=count(), "avg_age"=mean("age") by "team"
    /// ```
    Summarize {
        by: Vec<String>,
        metrics: Vec<Metric>,
    },

    /// Parses a JSON string
    ParseJson,

    /// Parses a CSV string
    ParseCsv(CsvOptions),

    /// Parses an XML string
    ParseXml(XmlOptions),

    /// Parses a YAML string
    ParseYaml,
}

impl Stage {
    /// The command keyword that introduces this stage.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Comment(_) => "comment",
            Stage::Hello => "hello",
            Stage::Ping(_) => "ping",
            Stage::Echo(_) => "echo",
            Stage::Scope(_) => "scope",
            Stage::Expression(_) => "jsonata",
            Stage::Distinct(_) => "distinct",
            Stage::MvExpand { .. } => "mv-expand",
            Stage::Count => "count",
            Stage::Limit(_) => "limit",
            Stage::Command(op) => op.name(),
            Stage::OrderBy(_) => "order by",
            Stage::Extend(_) => "extend",
            Stage::Project(_) => "project",
            Stage::ProjectAway(_) => "project-away",
            Stage::Summarize { .. } => "summarize",
            Stage::ParseJson => "parse-json",
            Stage::ParseCsv(_) => "parse-csv",
            Stage::ParseXml(_) => "parse-xml",
            Stage::ParseYaml => "parse-yaml",
        }
    }
}

/// Sort direction for `order by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One key of an `order by` stage.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderField {
    pub field: String,
    pub direction: Direction,
}

/// An item of `project` or `extend`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectItem {
    /// Copies a field, optionally under another name
    ///
    /// # Examples
    /// ```text
    /// "name"
    /// "city"="address.city"
    /// "address.city" as "city"
    /// ```
    Ref {
        field: String,
        alias: Option<String>,
    },

    /// Computes a registry operator over per-row arguments
    ///
    /// # Examples
    /// ```text
    /// toupper("name")
    /// "total"=sum("a","b")
    /// ```
    Function {
        operator: Operator,
        args: Vec<FunctionArg>,
        alias: Option<String>,
    },
}

impl ProjectItem {
    /// The key this item writes into.
    pub fn target(&self) -> &str {
        match self {
            ProjectItem::Ref { field, alias } => alias.as_deref().unwrap_or(field),
            ProjectItem::Function {
                operator, alias, ..
            } => alias.as_deref().unwrap_or(operator.name()),
        }
    }
}

/// Argument of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArg {
    /// `"field"` - read from the current row
    Ref(String),
    /// `'text'` - string literal
    String(String),
    /// `42` - number literal
    Number(f64),
}

impl FunctionArg {
    /// Resolve the argument against a row.
    pub fn resolve(&self, row: &Value) -> Value {
        match self {
            FunctionArg::Ref(field) => row.get(field),
            FunctionArg::String(s) => Value::String(s.clone()),
            FunctionArg::Number(n) => Value::Number(*n),
        }
    }
}

/// A metric of `summarize`.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub operator: Operator,
    pub args: Vec<FunctionArg>,
    pub alias: Option<String>,
}

impl Metric {
    /// The key the metric result is written under.
    pub fn target(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.operator.name())
    }
}
