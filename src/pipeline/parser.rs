/// How a raw model response is split into a step's output keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputParser {
    /// The whole response, untouched, bound to the single output key
    #[default]
    Verbatim,
    /// Split on a separator into exactly as many trimmed fields as there are
    /// output keys
    Delimited(String),
}

impl OutputParser {
    /// Split `raw` into `expected` fields. On a count mismatch the number of
    /// fields actually found is returned.
    pub fn parse(&self, raw: &str, expected: usize) -> Result<Vec<String>, usize> {
        match self {
            OutputParser::Verbatim => {
                if expected == 1 {
                    Ok(vec![raw.to_string()])
                } else {
                    Err(1)
                }
            }
            OutputParser::Delimited(separator) => {
                let fields: Vec<String> = raw
                    .trim()
                    .split(separator.as_str())
                    .map(|f| f.trim().to_string())
                    .collect();
                if fields.len() == expected {
                    Ok(fields)
                } else {
                    Err(fields.len())
                }
            }
        }
    }
}
