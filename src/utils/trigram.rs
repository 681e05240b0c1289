/// A trigram is three chars packed into a u64 (21 bits per char, 63 bits used)
pub type Trigram = u64;

/// Boundary padding used around terms
pub const PAD: char = ' ';

const CHAR_BITS: u32 = 21;
const CHAR_MASK: u64 = (1 << CHAR_BITS) - 1;

/// Convert 3 chars to a trigram
#[inline]
pub fn chars_to_trigram(c0: char, c1: char, c2: char) -> Trigram {
    ((c0 as u64) << (2 * CHAR_BITS)) | ((c1 as u64) << CHAR_BITS) | (c2 as u64)
}

/// Convert trigram back to chars
#[inline]
pub fn trigram_to_chars(t: Trigram) -> [char; 3] {
    let unpack = |shift: u32| {
        char::from_u32(((t >> shift) & CHAR_MASK) as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
    };
    [unpack(2 * CHAR_BITS), unpack(CHAR_BITS), unpack(0)]
}

/// Render a trigram as a 3-char string
pub fn trigram_to_string(t: Trigram) -> String {
    trigram_to_chars(t).iter().collect()
}

/// Parse a string of exactly three chars into a trigram
pub fn parse_trigram(s: &str) -> Option<Trigram> {
    let mut chars = s.chars();
    let (c0, c1, c2) = (chars.next()?, chars.next()?, chars.next()?);
    if chars.next().is_some() {
        return None;
    }
    Some(chars_to_trigram(c0, c1, c2))
}

fn windows(chars: &[char]) -> impl Iterator<Item = Trigram> + '_ {
    chars.windows(3).map(|w| chars_to_trigram(w[0], w[1], w[2]))
}

fn sorted_unique(mut trigrams: Vec<Trigram>) -> Vec<Trigram> {
    trigrams.sort_unstable();
    trigrams.dedup();
    trigrams
}

/// Extract unique trigrams of `"  " + term + "  "`.
///
/// A term of n chars yields n + 2 windows before deduplication, so even
/// one- and two-char terms get their full boundary set.
pub fn padded_trigrams(term: &str) -> Vec<Trigram> {
    if term.is_empty() {
        return Vec::new();
    }

    let mut padded = Vec::with_capacity(term.len() + 4);
    padded.extend([PAD, PAD]);
    padded.extend(term.chars());
    padded.extend([PAD, PAD]);

    sorted_unique(windows(&padded).collect())
}

/// Trigrams fully inside a fragment (no padding). Fragments shorter than
/// three chars have none.
pub fn internal_trigrams(fragment: &str) -> Vec<Trigram> {
    let chars: Vec<char> = fragment.chars().collect();
    sorted_unique(windows(&chars).collect())
}

/// Trigrams of a fragment anchored at the start of a term:
/// `"  " + c0`, `" " + c0 + c1` and the internal trigrams
pub fn leading_trigrams(fragment: &str) -> Vec<Trigram> {
    let chars: Vec<char> = fragment.chars().collect();
    let mut trigrams: Vec<Trigram> = windows(&chars).collect();

    if let Some(&first) = chars.first() {
        trigrams.push(chars_to_trigram(PAD, PAD, first));
    }
    if chars.len() >= 2 {
        trigrams.push(chars_to_trigram(PAD, chars[0], chars[1]));
    }

    sorted_unique(trigrams)
}

/// Trigrams of a fragment anchored at the end of a term:
/// `cn-1 + cn + " "`, `cn + "  "` and the internal trigrams
pub fn trailing_trigrams(fragment: &str) -> Vec<Trigram> {
    let chars: Vec<char> = fragment.chars().collect();
    let mut trigrams: Vec<Trigram> = windows(&chars).collect();

    if let Some(&last) = chars.last() {
        trigrams.push(chars_to_trigram(last, PAD, PAD));
    }
    if chars.len() >= 2 {
        let n = chars.len();
        trigrams.push(chars_to_trigram(chars[n - 2], chars[n - 1], PAD));
    }

    sorted_unique(trigrams)
}
