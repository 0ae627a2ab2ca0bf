//! Roman Urdu to Urdu script conversion.
//!
//! Urdu voices read Urdu script; users frequently type Urdu with Latin letters.
//! Known words go through a lookup table, anything else is spelled out with a
//! greedy letter mapping. `[pause]` markers are left untouched.

use super::PAUSE_MARKER;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static WORDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("salam", "سلام"),
        ("assalamualaikum", "السلام علیکم"),
        ("aap", "آپ"),
        ("tum", "تم"),
        ("main", "میں"),
        ("mein", "میں"),
        ("wo", "وہ"),
        ("woh", "وہ"),
        ("ye", "یہ"),
        ("yeh", "یہ"),
        ("ka", "کا"),
        ("ki", "کی"),
        ("ke", "کے"),
        ("ko", "کو"),
        ("se", "سے"),
        ("par", "پر"),
        ("hai", "ہے"),
        ("hain", "ہیں"),
        ("ho", "ہو"),
        ("hun", "ہوں"),
        ("tha", "تھا"),
        ("thi", "تھی"),
        ("the", "تھے"),
        ("na", "نہ"),
        ("bhi", "بھی"),
        ("to", "تو"),
        ("aur", "اور"),
        ("lekin", "لیکن"),
        ("agar", "اگر"),
        ("kyun", "کیوں"),
        ("kya", "کیا"),
        ("kaise", "کیسے"),
        ("kitna", "کتنا"),
        ("kitne", "کتنے"),
        ("kahan", "کہاں"),
        ("kab", "کب"),
        ("mera", "میرا"),
        ("meri", "میری"),
        ("hamara", "ہمارا"),
        ("tera", "تیرا"),
        ("teri", "تیری"),
        ("naam", "نام"),
        ("allah", "اللہ"),
        ("khuda", "خدا"),
        ("hafiz", "حافظ"),
        ("shukriya", "شکریہ"),
        ("meherbani", "مہربانی"),
        ("maaf", "معاف"),
        ("ji", "جی"),
        ("han", "ہاں"),
        ("haan", "ہاں"),
        ("nahi", "نہیں"),
        ("nahin", "نہیں"),
        ("acha", "اچھا"),
        ("accha", "اچھا"),
        ("dost", "دوست"),
        ("ghar", "گھر"),
        ("pani", "پانی"),
        ("khana", "کھانا"),
        ("aaj", "آج"),
        ("kal", "کل"),
        ("din", "دن"),
        ("raat", "رات"),
        ("subah", "صبح"),
        ("shaam", "شام"),
        ("ahmed", "احمد"),
    ])
});

// Longest spellings first so digraphs win over their single letters.
const LETTERS: &[(&str, &str)] = &[
    ("kh", "خ"),
    ("gh", "غ"),
    ("sh", "ش"),
    ("ch", "چ"),
    ("zh", "ژ"),
    ("th", "تھ"),
    ("ph", "پھ"),
    ("bh", "بھ"),
    ("dh", "دھ"),
    ("jh", "جھ"),
    ("aa", "ا"),
    ("ee", "ی"),
    ("oo", "و"),
    ("a", "ا"),
    ("b", "ب"),
    ("c", "ک"),
    ("d", "د"),
    ("e", "ے"),
    ("f", "ف"),
    ("g", "گ"),
    ("h", "ہ"),
    ("i", "ی"),
    ("j", "ج"),
    ("k", "ک"),
    ("l", "ل"),
    ("m", "م"),
    ("n", "ن"),
    ("o", "و"),
    ("p", "پ"),
    ("q", "ق"),
    ("r", "ر"),
    ("s", "س"),
    ("t", "ت"),
    ("u", "و"),
    ("v", "و"),
    ("w", "و"),
    ("x", "کس"),
    ("y", "ی"),
    ("z", "ز"),
];

/// Extended Arabic-Indic digits used in Urdu text
const URDU_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];

/// True when the text is Latin-script only, i.e. worth transliterating
pub fn needs_transliteration(text: &str) -> bool {
    let has_latin = text.chars().any(|c| c.is_ascii_alphabetic());
    let has_arabic_script = text.chars().any(is_arabic_script);
    has_latin && !has_arabic_script
}

pub fn transliterate_roman_urdu(text: &str) -> String {
    text.split(PAUSE_MARKER)
        .map(transliterate_segment)
        .collect::<Vec<_>>()
        .join(PAUSE_MARKER)
}

fn transliterate_segment(segment: &str) -> String {
    let mut output = String::with_capacity(segment.len() * 2);
    let mut word = String::new();

    for c in segment.chars() {
        if c.is_ascii_alphabetic() {
            word.push(c.to_ascii_lowercase());
            continue;
        }
        if !word.is_empty() {
            output.push_str(&transliterate_word(&word));
            word.clear();
        }
        match c {
            '?' => output.push('؟'),
            '0'..='9' => output.push(URDU_DIGITS[(c as u8 - b'0') as usize]),
            other => output.push(other),
        }
    }
    if !word.is_empty() {
        output.push_str(&transliterate_word(&word));
    }

    output
}

fn transliterate_word(word: &str) -> String {
    if let Some(urdu) = WORDS.get(word) {
        return (*urdu).to_string();
    }

    let mut output = String::new();
    let mut rest = word;
    while !rest.is_empty() {
        match LETTERS.iter().find(|(roman, _)| rest.starts_with(roman)) {
            Some((roman, urdu)) => {
                output.push_str(urdu);
                rest = &rest[roman.len()..];
            }
            None => {
                // Only ASCII letters reach here, all of which are in LETTERS
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    output.push(c);
                }
                rest = chars.as_str();
            }
        }
    }
    output
}

fn is_arabic_script(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{FB50}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFF}')
}
