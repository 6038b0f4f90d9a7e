use crate::constants::{MAX_FACTS_IN_PROMPT, NO_STORY_SENTINEL};
use crate::models::{Fact, TasteProfile};
use crate::story::lexicon::Lexicon;

/// The FACTS block is the sole permitted ground truth for a story: header
/// lines for the place and distance, then one numbered line per fact.
pub fn build_facts_block(label: &str, display_distance_m: f64, lang: &str, facts: &[Fact]) -> String {
    let lexicon = Lexicon::for_lang(lang);
    let mut lines = vec![
        format!("PLACE: {}", label),
        format!(
            "DISTANCE: {}",
            lexicon.approx_distance_phrase(display_distance_m as i64)
        ),
    ];
    for (i, fact) in facts.iter().take(MAX_FACTS_IN_PROMPT).enumerate() {
        lines.push(format!("FACT {}: {}", i + 1, fact.text));
    }
    lines.join("\n")
}

/// The language the story must be written in, named for the model.
fn language_name(lang: &str) -> &'static str {
    match Lexicon::for_lang(lang).lang {
        "he" => "Hebrew",
        "fr" => "French",
        _ => "English",
    }
}

/// Strict grounding contract for the generator.
pub fn system_prompt(lang: &str) -> String {
    format!(
        "You narrate short roadside stories about nearby places. Write entirely in {language}.\n\
         Hard rules:\n\
         - Use ONLY the FACTS block in the user message. No outside knowledge, no invented details.\n\
         - No filler, no superlatives, no generic driving advice, no cliche closing lines.\n\
         - Keep it safe for teenagers: if conflict appears in the facts, mention it briefly and without graphic detail.\n\
         - Output a single paragraph: no headings, no lists, no blank lines.\n\
         - Every sentence must contain at least one concrete fact: a year, date, number, name, event, place, body of water, or route.\n\
         - If the facts cannot ground a story, output exactly {sentinel} and nothing else.",
        language = language_name(lang),
        sentinel = NO_STORY_SENTINEL,
    )
}

/// Tone adjectives derived from the coarse taste weights.
fn tone_clause(taste: &TasteProfile) -> String {
    let mut tones = Vec::new();
    if taste.humor >= 0.65 {
        tones.push("lightly humorous");
    }
    if taste.nerdy >= 0.65 {
        tones.push("detail-loving");
    }
    if taste.dramatic >= 0.65 {
        tones.push("vivid");
    }
    if tones.is_empty() {
        "warm and direct".to_string()
    } else {
        tones.join(", ")
    }
}

pub fn user_prompt(
    facts_block: &str,
    lang: &str,
    min_words: usize,
    max_words: usize,
    taste: &TasteProfile,
) -> String {
    // Shortness squeezes the target toward the lower bound
    let effective_max = if taste.shortness >= 0.65 {
        min_words + (max_words - min_words) / 2
    } else {
        max_words
    };

    format!(
        "Tell the story of the place below in {language}, tone: {tone}.\n\
         Structure:\n\
         - Sentences 1-2: anchor the place by name and distance, straight in, no greeting.\n\
         - Middle sentences: one distinct concrete fact each, preferring facts with years, dates or names.\n\
         - Final sentence: close on a concrete fact from the FACTS block, not a farewell.\n\
         Length: between {min} and {max} words.\n\
         If the facts are too thin for that, output exactly {sentinel}.\n\n\
         {facts}",
        language = language_name(lang),
        tone = tone_clause(taste),
        min = min_words,
        max = effective_max,
        sentinel = NO_STORY_SENTINEL,
        facts = facts_block,
    )
}

/// One-shot corrective prompt: same FACTS block, the failure named, the
/// bad draft quoted. A compliant rewrite or the sentinel are the only
/// acceptable outcomes.
pub fn repair_prompt(
    facts_block: &str,
    lang: &str,
    min_words: usize,
    max_words: usize,
    failure_reason: &str,
    bad_draft: &str,
) -> String {
    format!(
        "Your previous draft was rejected: {reason}.\n\
         Rewrite it so it complies, in {language}, between {min} and {max} words, one paragraph.\n\
         Use only the FACTS block below; do not introduce any new facts.\n\
         If you cannot comply, output exactly {sentinel}.\n\n\
         {facts}\n\n\
         REJECTED DRAFT:\n{draft}",
        reason = failure_reason,
        language = language_name(lang),
        min = min_words,
        max = max_words,
        sentinel = NO_STORY_SENTINEL,
        facts = facts_block,
        draft = bad_draft,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(n: usize) -> Vec<Fact> {
        (0..n)
            .map(|i| Fact::from_sentence(&format!("Fact number {} happened in {}", i, 1800 + i)).unwrap())
            .collect()
    }

    #[test]
    fn test_facts_block_shape() {
        let block = build_facts_block("Big Ben", 450.0, "en", &facts(3));
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[0], "PLACE: Big Ben");
        assert_eq!(lines[1], "DISTANCE: about 450 meters from here");
        assert!(lines[2].starts_with("FACT 1: "));
        assert!(lines[4].starts_with("FACT 3: "));
    }

    #[test]
    fn test_facts_block_caps_at_eighteen() {
        let block = build_facts_block("Big Ben", 450.0, "en", &facts(22));
        assert!(block.contains("FACT 18: "));
        assert!(!block.contains("FACT 19: "));
    }

    #[test]
    fn test_system_prompt_names_language_and_sentinel() {
        let prompt = system_prompt("he");
        assert!(prompt.contains("Hebrew"));
        assert!(prompt.contains("NO_STORY"));

        assert!(system_prompt("en").contains("English"));
        assert!(system_prompt("fr-ca").contains("French"));
    }

    #[test]
    fn test_user_prompt_includes_bounds_and_block() {
        let block = build_facts_block("Big Ben", 450.0, "en", &facts(3));
        let prompt = user_prompt(&block, "en", 180, 340, &TasteProfile::default());
        assert!(prompt.contains("between 180 and 340 words"));
        assert!(prompt.contains("PLACE: Big Ben"));
    }

    #[test]
    fn test_shortness_squeezes_upper_bound() {
        let taste = TasteProfile {
            shortness: 0.9,
            ..TasteProfile::default()
        };
        let prompt = user_prompt("FACTS", "en", 180, 340, &taste);
        assert!(prompt.contains("between 180 and 260 words"));
    }

    #[test]
    fn test_repair_prompt_quotes_draft_and_reason() {
        let prompt = repair_prompt("FACTS", "en", 180, 340, "bad_length", "too short");
        assert!(prompt.contains("bad_length"));
        assert!(prompt.contains("REJECTED DRAFT:\ntoo short"));
        assert!(prompt.contains("FACTS"));
    }
}
