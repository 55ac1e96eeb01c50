//! # Vocabulary Construction Options

use compact_str::CompactString;

/// The mask token; occupies id 0 when the mask scheme is active.
pub const MASK_TOKEN: &str = "[MASK]";

/// The out-of-vocabulary token; occupies id 1 when the mask scheme is active.
pub const OOV_TOKEN: &str = "[UNK]";

/// The default message-start token.
pub const MESSAGE_START: &str = "[START]";

/// The default message-terminator character.
pub const MESSAGE_TERMINATOR: char = '$';

/// The 26 paired upper/lower Latin letters in interleaved order.
///
/// Leading the symbol table with this block guarantees a predictable low-id
/// region for the most common training domain.
pub(crate) const LATIN_PAIRS: &str = "aAbBcCdDeEfFgGhHiIjJkKlLmMnNoOpPqQrRsStTuUvVwWxXyYzZ";

/// Options for building a [`super::CharVocab`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabOptions {
    /// Reserve id 0 for [`MASK_TOKEN`] and id 1 for [`OOV_TOKEN`].
    pub mask_scheme: bool,

    /// Message-start token to include in the reserved prefix, if any.
    pub message_start: Option<CompactString>,

    /// Lead the symbol table with the paired Latin letter block.
    pub latin_prefix: bool,
}

impl Default for VocabOptions {
    fn default() -> Self {
        Self::generator()
    }
}

impl VocabOptions {
    /// The generation profile: mask scheme, message-start token,
    /// and the Latin letter prefix.
    pub fn generator() -> Self {
        Self {
            mask_scheme: true,
            message_start: Some(MESSAGE_START.into()),
            latin_prefix: true,
        }
    }

    /// The rating profile: mask scheme only; symbols inherit corpus order.
    pub fn rater() -> Self {
        Self {
            mask_scheme: true,
            message_start: None,
            latin_prefix: false,
        }
    }

    /// Sets the mask scheme flag.
    pub fn with_mask_scheme(
        self,
        mask_scheme: bool,
    ) -> Self {
        Self {
            mask_scheme,
            ..self
        }
    }

    /// Sets the message-start token.
    pub fn with_message_start<S: Into<CompactString>>(
        self,
        token: Option<S>,
    ) -> Self {
        Self {
            message_start: token.map(Into::into),
            ..self
        }
    }

    /// Sets the Latin letter prefix flag.
    pub fn with_latin_prefix(
        self,
        latin_prefix: bool,
    ) -> Self {
        Self {
            latin_prefix,
            ..self
        }
    }

    /// The reserved tokens this policy places ahead of ordinary symbols,
    /// in id order.
    pub fn reserved_prefix(&self) -> Vec<CompactString> {
        let mut prefix = Vec::new();
        if self.mask_scheme {
            prefix.push(MASK_TOKEN.into());
            prefix.push(OOV_TOKEN.into());
        }
        if let Some(start) = &self.message_start {
            prefix.push(start.clone());
        }
        prefix
    }
}
