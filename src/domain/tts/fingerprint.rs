use xxhash_rust::xxh3::xxh3_128;

/// Cache key for a synthesis request.
///
/// Hashes the exact parameter tuple. No normalization happens here: two
/// requests differing only in whitespace get different fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn compute(text: &str, voice_key: &str, pitch: i32, rate: i32, gap_ms: u32) -> Self {
        let mut s = String::with_capacity(text.len() + voice_key.len() + 32);
        s.push_str(voice_key);
        s.push('|');
        s.push_str(&pitch.to_string());
        s.push('|');
        s.push_str(&rate.to_string());
        s.push('|');
        s.push_str(&gap_ms.to_string());
        s.push('|');
        s.push_str(text);
        let hash = xxh3_128(s.as_bytes());
        Fingerprint(format!("{hash:032x}"))
    }

    /// Accepts only the 32 lowercase hex digits `compute` produces
    pub fn parse(value: &str) -> Option<Self> {
        let valid = value.len() == 32
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Fingerprint(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
