//! Metadata trailer appended to exported note bodies.
//!
//! ```text
//! <body>
//!
//! ---
//! Tags: SHOPPING, URGENT
//! Important: true
//! ```
//!
//! Tag names are written as-is. There is no escaping, so a tag containing
//! a comma reads back as two tags.

const SEPARATOR: &str = "\n\n---\n";
const SEPARATOR_LINE: &str = "\n---\n";
const TAGS_KEY: &str = "Tags:";
const IMPORTANT_KEY: &str = "Important:";

/// Tags and importance carried after the `---` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteTrailer {
    pub tags: Vec<String>,
    pub important: bool,
}

impl NoteTrailer {
    pub fn new(tags: Vec<String>, important: bool) -> Self {
        Self { tags, important }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && !self.important
    }

    /// Appends the trailer to `body`. An empty trailer writes nothing.
    pub fn encode(&self, body: &str) -> String {
        if self.is_empty() {
            return body.to_string();
        }

        let mut meta = Vec::with_capacity(2);
        if !self.tags.is_empty() {
            meta.push(format!("{TAGS_KEY} {}", self.tags.join(", ")));
        }
        if self.important {
            meta.push(format!("{IMPORTANT_KEY} true"));
        }
        format!("{body}{SEPARATOR}{}", meta.join("\n"))
    }

    /// Splits text into body and trailer.
    ///
    /// Only the last `---` line counts, and only if every non-blank line
    /// after it is a `Tags:` or `Important:` line, so a horizontal rule inside
    /// the body is left alone. Trailing line breaks are stripped from the
    /// body when a trailer is found.
    pub fn split(text: &str) -> (String, NoteTrailer) {
        let Some((body, meta)) = split_at_separator(text) else {
            return (text.to_string(), NoteTrailer::default());
        };

        let mut trailer = NoteTrailer::default();
        for line in meta.lines().map(str::trim) {
            if let Some(value) = line.strip_prefix(TAGS_KEY) {
                trailer.tags = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
            } else if let Some(value) = line.strip_prefix(IMPORTANT_KEY) {
                trailer.important = value.trim().eq_ignore_ascii_case("true");
            }
        }

        (body.trim_end_matches(['\n', '\r']).to_string(), trailer)
    }
}

fn split_at_separator(text: &str) -> Option<(&str, &str)> {
    let (body, meta) = text.rsplit_once(SEPARATOR_LINE)?;

    let is_meta = meta.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with(TAGS_KEY) || line.starts_with(IMPORTANT_KEY)
    });
    is_meta.then_some((body, meta))
}
