//! Character vocabulary.

/// Padding id. It is reserved by the scoring model and never produced by [`encode()`].
pub const PAD_ID: i64 = 0;

/// Id of characters outside the vocabulary.
pub const UNK_ID: i64 = 1;

/// Characters of the vocabulary in id order, starting from id 2.
pub const VOCAB: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Number of ids including padding and unknown.
pub const VOCAB_SIZE: usize = VOCAB.len() + 2;

const CHAR_IDS: [i64; 128] = {
    let mut table = [UNK_ID; 128];
    let mut i = 0;
    while i < VOCAB.len() {
        table[VOCAB[i] as usize] = i as i64 + 2;
        i += 1;
    }
    table
};

/// Gets the vocabulary id of a given character.
///
/// # Arguments
///
/// * `c` - A character.
///
/// # Returns
///
/// An id in `2..VOCAB_SIZE` for lowercase ASCII letters and digits, otherwise [`UNK_ID`].
///
/// # Examples
///
/// ```
/// use dksplit::encoder::{char_id, UNK_ID};
///
/// assert_eq!(2, char_id('a'));
/// assert_eq!(28, char_id('0'));
/// assert_eq!(UNK_ID, char_id('A'));
/// assert_eq!(UNK_ID, char_id('é'));
/// ```
pub const fn char_id(c: char) -> i64 {
    let code = c as u32;
    if code < 128 {
        CHAR_IDS[code as usize]
    } else {
        UNK_ID
    }
}

/// Encodes a text into vocabulary ids, one per character.
///
/// # Arguments
///
/// * `text` - A normalized text.
///
/// # Returns
///
/// A newly allocated vector of ids.
///
/// # Examples
///
/// ```
/// use dksplit::encoder::encode;
///
/// assert_eq!(vec![9, 6, 1, 30], encode("he-2"));
/// ```
pub fn encode(text: &str) -> Vec<i64> {
    let mut ids = Vec::with_capacity(text.len());
    encode_into(text, &mut ids);
    ids
}

/// Appends vocabulary ids of a text to a given buffer.
///
/// Batches of equal-length texts are laid out row by row with this function.
pub fn encode_into(text: &str, ids: &mut Vec<i64>) {
    ids.extend(text.chars().map(char_id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_id_vocab() {
        for (i, &c) in VOCAB.iter().enumerate() {
            assert_eq!(i as i64 + 2, char_id(c as char));
        }
        assert_eq!(37, char_id('9'));
        assert_eq!(38, VOCAB_SIZE);
    }

    #[test]
    fn test_char_id_unknown() {
        for c in ['A', 'Z', '-', '.', ' ', '\0', '\u{7f}', 'ß', 'あ', '\u{1f600}'] {
            assert_eq!(UNK_ID, char_id(c));
        }
    }

    #[test]
    fn test_pad_never_produced() {
        let ids = encode("\0abc\u{80}xyz019!");

        assert!(ids.iter().all(|&id| id != PAD_ID));
    }

    #[test]
    fn test_encode_counts_code_points() {
        let ids = encode("añb");

        assert_eq!(vec![2, UNK_ID, 3], ids);
    }

    #[test]
    fn test_encode_empty() {
        assert!(encode("").is_empty());
    }

    #[test]
    fn test_encode_into_appends() {
        let mut ids = encode("ab");
        encode_into("cd", &mut ids);

        assert_eq!(vec![2, 3, 4, 5], ids);
    }
}
