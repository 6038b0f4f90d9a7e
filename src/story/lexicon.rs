/// Per-language word lists and phrasing. Latin-script languages match
/// case-insensitively; others match exactly.
pub struct Lexicon {
    pub lang: &'static str,
    pub latin_script: bool,
    /// Tokens marking a sentence as historically substantive
    pub signal_tokens: &'static [&'static str],
    /// Filler phrases the validator rejects outright
    pub filler_denylist: &'static [&'static str],
    /// Conflict / graphic-violence patterns dropped at the fact level
    pub sensitive_denylist: &'static [&'static str],
    /// `{}` is substituted with the rounded distance in meters
    distance_template: &'static str,
}

static EN: Lexicon = Lexicon {
    lang: "en",
    latin_script: true,
    signal_tokens: &[
        "built", "founded", "established", "century", "ancient", "king", "queen", "emperor",
        "architect", "designed", "restored", "opened", "named", "monument", "museum", "ruins",
        "dynasty", "excavated",
    ],
    filler_denylist: &[
        "hidden gem", "nestled", "breathtaking", "must-see", "must see", "rich history",
        "stunning", "whether you", "as you drive", "buckle up", "journey through time",
        "step back in time", "something for everyone", "drive safely",
    ],
    sensitive_denylist: &[
        "war", "terror", "massacre", "bombing", "holocaust", "murder", "atrocity", "execution",
    ],
    distance_template: "about {} meters from here",
};

static HE: Lexicon = Lexicon {
    lang: "he",
    latin_script: false,
    signal_tokens: &[
        "נבנה", "נבנתה", "נוסד", "נוסדה", "הוקם", "הוקמה", "המאה", "עתיק", "עתיקה", "מלך",
        "מלכה", "אדריכל", "שוחזר", "נחנך", "נפתח", "אנדרטה", "מוזיאון", "חפירות",
    ],
    filler_denylist: &[
        "פנינה נסתרת", "עוצר נשימה", "עוצרת נשימה", "חובה לבקר", "היסטוריה עשירה",
        "מסע בזמן", "יש בו משהו לכולם", "סעו בזהירות",
    ],
    sensitive_denylist: &[
        "מלחמה", "מלחמת", "טרור", "טבח", "פיגוע", "שואה", "רצח", "הוצאה להורג",
    ],
    distance_template: "כ-{} מטרים מכאן",
};

static FR: Lexicon = Lexicon {
    lang: "fr",
    latin_script: true,
    signal_tokens: &[
        "construit", "construite", "fondé", "fondée", "siècle", "ancien", "ancienne", "roi",
        "reine", "architecte", "restauré", "inauguré", "monument", "musée", "fouilles",
    ],
    filler_denylist: &[
        "joyau caché", "à couper le souffle", "incontournable", "riche histoire",
        "voyage dans le temps", "pour tous les goûts",
    ],
    sensitive_denylist: &[
        "guerre", "terreur", "massacre", "attentat", "holocauste", "meurtre", "exécution",
    ],
    distance_template: "à environ {} mètres d'ici",
};

impl Lexicon {
    /// Lexicon for a normalized language code; region subtags are ignored
    /// and unknown languages fall back to English.
    pub fn for_lang(lang: &str) -> &'static Lexicon {
        match lang.get(..2) {
            Some("he") | Some("iw") => &HE,
            Some("fr") => &FR,
            _ => &EN,
        }
    }

    /// Every supported lexicon; the sensitive filter checks all of them
    /// because fact text does not always follow the request language.
    pub fn all() -> [&'static Lexicon; 3] {
        [&EN, &HE, &FR]
    }

    fn matches(&self, text: &str, needle: &str) -> bool {
        if self.latin_script {
            text.to_lowercase().contains(&needle.to_lowercase())
        } else {
            text.contains(needle)
        }
    }

    /// Whole-word match for Latin scripts ("war" must not hit "award");
    /// plain containment elsewhere, where prefixes are part of the word.
    fn matches_word(&self, text: &str, needle: &str) -> bool {
        if !self.latin_script {
            return text.contains(needle);
        }
        let text = text.to_lowercase();
        let needle = needle.to_lowercase();
        let mut start = 0;
        while let Some(pos) = text[start..].find(&needle) {
            let abs = start + pos;
            let before_ok = text[..abs]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphabetic());
            let after = abs + needle.len();
            let after_ok = text[after..].chars().next().map_or(true, |c| !c.is_alphabetic());
            if before_ok && after_ok {
                return true;
            }
            start = abs + needle.len().max(1);
        }
        false
    }

    pub fn has_signal_token(&self, text: &str) -> bool {
        self.signal_tokens.iter().any(|t| self.matches(text, t))
    }

    /// First filler phrase found in the text, if any. `extra` carries
    /// operator-configured additions.
    pub fn find_filler(&self, text: &str, extra: &[String]) -> Option<String> {
        self.filler_denylist
            .iter()
            .map(|s| s.to_string())
            .chain(extra.iter().cloned())
            .find(|phrase| self.matches(text, phrase))
    }

    /// First sensitive pattern found in the text, if any.
    pub fn find_sensitive(&self, text: &str, extra: &[String]) -> Option<String> {
        self.sensitive_denylist
            .iter()
            .map(|s| s.to_string())
            .chain(extra.iter().cloned())
            .find(|pattern| self.matches_word(text, pattern))
    }

    pub fn approx_distance_phrase(&self, meters: i64) -> String {
        self.distance_template.replace("{}", &meters.to_string())
    }
}

/// Normalize a wire language code: lowercase, at most 5 characters.
pub fn normalize_lang(raw: &str) -> String {
    let lang = raw.trim().to_lowercase();
    if lang.is_empty() {
        return "en".to_string();
    }
    lang.chars().take(5).collect()
}
