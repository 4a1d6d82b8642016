//! Character-level Unicode classification used for unknown-word synthesis.

/// Check the full Hiragana block (U+3040..U+309F).
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF) plus the halfwidth forms.
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c) || ('\u{FF66}'..='\u{FF9F}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
        || c == '々'
}

/// ASCII and fullwidth Latin letters.
pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic() || ('Ａ'..='Ｚ').contains(&c) || ('ａ'..='ｚ').contains(&c)
}

/// ASCII and fullwidth digits.
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c)
}

/// Character class driving unknown-word costs and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Hiragana,
    Katakana,
    Kanji,
    Latin,
    Digit,
    Symbol,
    Space,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if is_hiragana(c) {
            CharClass::Hiragana
        } else if is_katakana(c) {
            CharClass::Katakana
        } else if is_kanji(c) {
            CharClass::Kanji
        } else if is_latin(c) {
            CharClass::Latin
        } else if is_digit(c) {
            CharClass::Digit
        } else if c.is_whitespace() {
            CharClass::Space
        } else if c.is_ascii_punctuation() || ('\u{3000}'..='\u{303F}').contains(&c) {
            CharClass::Symbol
        } else {
            CharClass::Other
        }
    }
}

/// Number of leading characters of `s` that share the class of the first one.
pub fn class_run_len(s: &str) -> usize {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    let class = CharClass::of(first);
    1 + chars.take_while(|&c| CharClass::of(c) == class).count()
}
