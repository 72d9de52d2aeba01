use crate::errors::{DksplitError, Result};

/// Number of tags of the linear chain.
pub const NUM_TAGS: usize = 2;

/// Tag of a character.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u8)]
pub enum Tag {
    /// The character continues the current word.
    Continue = 0,

    /// The character begins a new word.
    Boundary = 1,
}

impl Tag {
    /// All tags in index order.
    pub const ALL: [Self; NUM_TAGS] = [Self::Continue, Self::Boundary];

    /// Gets a tag from its index.
    ///
    /// # Arguments
    ///
    /// * `idx` - A tag index.
    ///
    /// # Returns
    ///
    /// The tag if `idx` is less than [`NUM_TAGS`], otherwise None.
    pub const fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::Continue),
            1 => Some(Self::Boundary),
            _ => None,
        }
    }

    /// Gets the index of the tag.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Normalized text.
///
/// The text is lowercased and then truncated to a maximum number of characters. Every position
/// used by the encoder, the decoder and the word assembly is a code point position.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Sentence {
    pub(crate) text: String,
    pub(crate) char_to_str_pos: Vec<usize>,
}

impl Sentence {
    fn from_chars<I>(chars: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        let mut text = String::new();
        let mut char_to_str_pos = vec![0];
        for c in chars {
            text.push(c);
            char_to_str_pos.push(text.len());
        }
        Self {
            text,
            char_to_str_pos,
        }
    }

    /// Creates a new [`Sentence`] from a raw string.
    ///
    /// # Arguments
    ///
    /// * `text` - A raw string.
    /// * `max_len` - The maximum number of characters to keep.
    ///
    /// # Returns
    ///
    /// A new [`Sentence`]. It is empty if `text` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use dksplit::Sentence;
    ///
    /// let s = Sentence::from_raw("HelloWorld", 64);
    /// assert_eq!("helloworld", s.as_str());
    ///
    /// let s = Sentence::from_raw("HelloWorld", 5);
    /// assert_eq!("hello", s.as_str());
    /// ```
    pub fn from_raw<S>(text: S, max_len: usize) -> Self
    where
        S: AsRef<str>,
    {
        Self::from_chars(text.as_ref().to_lowercase().chars().take(max_len))
    }

    /// Creates a new [`Sentence`] from a tokenized string.
    ///
    /// # Arguments
    ///
    /// * `tokenized_text` - A string containing whitespaces between words.
    /// * `max_len` - The maximum number of characters to keep.
    ///
    /// # Returns
    ///
    /// A new [`Sentence`] and its reference tags.
    ///
    /// # Errors
    ///
    /// If `tokenized_text` contains no word, an error variant will be returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use dksplit::{Sentence, Tag};
    ///
    /// let (s, tags) = Sentence::from_tokenized("Hello world", 64).unwrap();
    /// assert_eq!("helloworld", s.as_str());
    /// assert_eq!(Tag::Boundary, tags[5]);
    ///
    /// assert!(Sentence::from_tokenized("  ", 64).is_err());
    /// ```
    pub fn from_tokenized<S>(tokenized_text: S, max_len: usize) -> Result<(Self, Vec<Tag>)>
    where
        S: AsRef<str>,
    {
        let mut chars = vec![];
        let mut tags = vec![];
        for word in tokenized_text.as_ref().split_whitespace() {
            for (i, c) in word.to_lowercase().chars().enumerate() {
                chars.push(c);
                tags.push(if i == 0 { Tag::Boundary } else { Tag::Continue });
            }
        }
        if chars.is_empty() {
            return Err(DksplitError::invalid_argument(
                "tokenized_text",
                "contains no word",
            ));
        }
        chars.truncate(max_len);
        tags.truncate(max_len);
        Ok((Self::from_chars(chars), tags))
    }

    /// Gets the normalized string.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Gets the number of characters.
    pub fn len(&self) -> usize {
        self.char_to_str_pos.len() - 1
    }

    /// Returns true if the sentence contains no character.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn check_path(&self, path: &[Tag]) -> Result<()> {
        if path.len() != self.len() {
            return Err(DksplitError::invalid_argument(
                "path",
                format!(
                    "expected {} tags for the sentence, got {}",
                    self.len(),
                    path.len()
                ),
            ));
        }
        Ok(())
    }

    /// Splits the sentence into words along a tag path.
    ///
    /// A word starts at every [`Tag::Boundary`] except at the first character, which always
    /// starts the first word. The concatenation of the words equals the sentence.
    ///
    /// # Arguments
    ///
    /// * `path` - Tags of each character.
    ///
    /// # Returns
    ///
    /// A newly allocated vector of words.
    ///
    /// # Errors
    ///
    /// If the length of `path` differs from the number of characters, an error variant will be
    /// returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use dksplit::{Sentence, Tag::*};
    ///
    /// let s = Sentence::from_raw("abcd", 64);
    /// assert_eq!(
    ///     vec!["ab", "cd"],
    ///     s.to_words(&[Continue, Continue, Boundary, Continue]).unwrap(),
    /// );
    /// ```
    pub fn to_words(&self, path: &[Tag]) -> Result<Vec<String>> {
        self.check_path(path)?;
        let mut result = vec![];
        let mut start = 0;
        for (i, &tag) in path.iter().enumerate() {
            let pos = self.char_to_str_pos[i];
            if tag == Tag::Boundary && pos > start {
                result.push(self.text[start..pos].to_string());
                start = pos;
            }
        }
        if start < self.text.len() {
            result.push(self.text[start..].to_string());
        }
        Ok(result)
    }

    /// Generates a string with whitespaces between words.
    ///
    /// # Arguments
    ///
    /// * `path` - Tags of each character.
    ///
    /// # Returns
    ///
    /// A newly allocated string.
    ///
    /// # Errors
    ///
    /// If the length of `path` differs from the number of characters, an error variant will be
    /// returned.
    pub fn to_tokenized_string(&self, path: &[Tag]) -> Result<String> {
        Ok(self.to_words(path)?.join(" "))
    }
}
