/// Placeholder syntax for bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (Postgres)
    Dollar,
    /// `?` for every parameter
    Question,
}

/// Identifier quoting and placeholder rendering for one SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFormatter {
    left_quote: &'static str,
    right_quote: &'static str,
    placeholders: PlaceholderStyle,
}

impl SqlFormatter {
    pub fn postgres() -> Self {
        Self {
            left_quote: "\"",
            right_quote: "\"",
            placeholders: PlaceholderStyle::Dollar,
        }
    }

    pub fn generic() -> Self {
        Self {
            left_quote: "",
            right_quote: "",
            placeholders: PlaceholderStyle::Question,
        }
    }

    pub fn quote(&self, identifier: &str) -> String {
        format!("{}{}{}", self.left_quote, identifier, self.right_quote)
    }

    /// Placeholder for the `index`-th parameter, counting from 1.
    pub fn placeholder(&self, index: usize) -> String {
        match self.placeholders {
            PlaceholderStyle::Dollar => format!("${}", index),
            PlaceholderStyle::Question => "?".to_string(),
        }
    }
}

impl Default for SqlFormatter {
    fn default() -> Self {
        Self::postgres()
    }
}
