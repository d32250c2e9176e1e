//! Minimal URI template matching (`{var}` and `{+var}` expressions).

use regex::Regex;

use super::tool::Arguments;

/// A parsed URI template such as `linear://teams/{teamId}/issues`
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    pattern: Regex,
    variables: Vec<String>,
    literal_len: usize,
}

/// Errors that can occur when parsing a URI template
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unclosed expression in URI template: {0}")]
    Unclosed(String),

    #[error("Invalid variable name '{name}' in URI template: {template}")]
    InvalidVariable { template: String, name: String },
}

impl UriTemplate {
    /// Parse a URI template
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut pattern = String::from("^");
        let mut variables = Vec::new();
        let mut literal_len = 0;
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let literal = &rest[..start];
            pattern.push_str(&regex::escape(literal));
            literal_len += literal.len();

            let after = &rest[start + 1..];
            let end = after
                .find('}')
                .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
            let expression = &after[..end];

            // `{+var}` may span path segments
            let (name, group) = match expression.strip_prefix('+') {
                Some(name) => (name, "(.+)"),
                None => (expression, "([^/?#]+)"),
            };

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TemplateError::InvalidVariable {
                    template: template.to_string(),
                    name: expression.to_string(),
                });
            }

            pattern.push_str(group);
            variables.push(name.to_string());
            rest = &after[end + 1..];
        }

        pattern.push_str(&regex::escape(rest));
        literal_len += rest.len();
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|_| TemplateError::InvalidVariable {
            template: template.to_string(),
            name: String::new(),
        })?;

        Ok(Self {
            template: template.to_string(),
            pattern,
            variables,
            literal_len,
        })
    }

    /// The original template string
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Variable names in order of appearance
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of literal characters, used to prefer the most specific template
    pub fn literal_len(&self) -> usize {
        self.literal_len
    }

    /// Match a concrete URI, returning the extracted variables as string arguments
    pub fn match_uri(&self, uri: &str) -> Option<Arguments> {
        let captures = self.pattern.captures(uri)?;
        let mut args = Arguments::new();
        for (i, name) in self.variables.iter().enumerate() {
            let value = captures.get(i + 1)?.as_str();
            args.insert(name.clone(), serde_json::Value::String(value.to_string()));
        }
        Some(args)
    }
}
