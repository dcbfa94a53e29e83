/// Options for `parse-csv`.
///
/// # Example
/// ```text
/// parse-csv --delimiter=';' --columns --comment='#'
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// Field delimiter, `,` by default
    pub delimiter: u8,

    /// Treat the first record as a header and emit one object per row
    pub columns: bool,

    /// Lines starting with this byte are ignored
    pub comment: Option<u8>,

    /// Drop records whose fields are all empty
    pub skip_empty_lines: bool,

    /// Accept records with a different number of fields than the first one
    pub relax_column_count: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            columns: false,
            comment: None,
            skip_empty_lines: false,
            relax_column_count: false,
        }
    }
}

/// Options for `parse-xml`.
///
/// # Example
/// ```text
/// parse-xml --attributes --attribute_prefix='_'
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct XmlOptions {
    /// Keep element attributes in the output
    pub attributes: bool,

    /// Prefix prepended to attribute names
    pub attribute_prefix: String,

    /// Key used for an element's text when it also has children or attributes
    pub text_node_name: String,

    /// Convert numeric and boolean text to numbers and booleans
    pub parse_values: bool,
}

impl Default for XmlOptions {
    fn default() -> Self {
        XmlOptions {
            attributes: false,
            attribute_prefix: "@_".to_string(),
            text_node_name: "#text".to_string(),
            parse_values: true,
        }
    }
}
