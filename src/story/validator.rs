use crate::constants::NO_STORY_SENTINEL;
use crate::story::lexicon::Lexicon;
use std::collections::HashMap;
use std::fmt;

/// Why a draft was rejected. The tag is the machine-readable reason used
/// in decisions and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    ModelNoStory,
    BadLength { words: usize },
    BannedFiller { phrase: String },
    NotOneParagraph,
}

impl ValidationFailure {
    pub fn tag(&self) -> &'static str {
        match self {
            ValidationFailure::ModelNoStory => "model_no_story",
            ValidationFailure::BadLength { .. } => "bad_length",
            ValidationFailure::BannedFiller { .. } => "banned_filler",
            ValidationFailure::NotOneParagraph => "not_one_paragraph",
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::ModelNoStory => write!(f, "model declined to tell a story"),
            ValidationFailure::BadLength { words } => {
                write!(f, "word count {} outside bounds", words)
            }
            ValidationFailure::BannedFiller { phrase } => {
                write!(f, "contains banned filler: {}", phrase)
            }
            ValidationFailure::NotOneParagraph => write!(f, "not a single paragraph"),
        }
    }
}

/// Draft validation. All rules must pass; the first violation reports.
pub struct StoryValidator {
    min_words: usize,
    max_words: usize,
    extra_filler: HashMap<String, Vec<String>>,
}

impl StoryValidator {
    pub fn new(
        min_words: usize,
        max_words: usize,
        extra_filler: HashMap<String, Vec<String>>,
    ) -> Self {
        StoryValidator {
            min_words,
            max_words,
            extra_filler,
        }
    }

    pub fn validate(&self, draft: &str, lang: &str) -> Result<(), ValidationFailure> {
        let trimmed = draft.trim();

        if trimmed == NO_STORY_SENTINEL {
            return Err(ValidationFailure::ModelNoStory);
        }

        let words = word_count(trimmed);
        if words < self.min_words || words > self.max_words {
            return Err(ValidationFailure::BadLength { words });
        }

        let lexicon = Lexicon::for_lang(lang);
        let no_extras = Vec::new();
        let extras = self.extra_filler.get(lexicon.lang).unwrap_or(&no_extras);
        if let Some(phrase) = lexicon.find_filler(trimmed, extras) {
            return Err(ValidationFailure::BannedFiller { phrase });
        }

        if has_paragraph_break(trimmed) {
            return Err(ValidationFailure::NotOneParagraph);
        }

        Ok(())
    }
}

/// Whitespace-split word count, empties ignored.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// A blank line (newline, optional whitespace, newline) splits paragraphs.
fn has_paragraph_break(text: &str) -> bool {
    for (i, c) in text.char_indices() {
        if c == '\n' {
            let rest = &text[i + 1..];
            let after_ws = rest.trim_start_matches([' ', '\t', '\r']);
            if after_ws.starts_with('\n') {
                return true;
            }
        }
    }
    false
}
