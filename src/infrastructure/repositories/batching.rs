use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?۔؟।]+\s+").expect("sentence pattern is valid"));

/// Split text into batches of at most `max_chars` characters.
///
/// Batches break on sentence-ending punctuation where possible. A run of text
/// with no sentence boundary that is still too long is cut on character
/// boundaries.
pub fn split_into_batches(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut batches = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut last_end = 0;

    let mut sentences: Vec<&str> = SENTENCE_END
        .find_iter(text)
        .map(|m| {
            let sentence = &text[last_end..m.end()];
            last_end = m.end();
            sentence
        })
        .collect();
    if last_end < text.len() {
        sentences.push(&text[last_end..]);
    }

    for sentence in sentences {
        let sentence_len = sentence.chars().count();

        if current_len > 0 && current_len + sentence_len > max_chars {
            push_trimmed(&mut batches, &current);
            current.clear();
            current_len = 0;
        }

        if sentence_len > max_chars {
            let chars: Vec<char> = sentence.chars().collect();
            for chunk in chars.chunks(max_chars) {
                push_trimmed(&mut batches, &chunk.iter().collect::<String>());
            }
            continue;
        }

        current.push_str(sentence);
        current_len += sentence_len;
    }

    push_trimmed(&mut batches, &current);
    batches
}

fn push_trimmed(batches: &mut Vec<String>, batch: &str) {
    let trimmed = batch.trim();
    if !trimmed.is_empty() {
        batches.push(trimmed.to_string());
    }
}
