//! # Character Vocabulary Codec

use std::collections::{BTreeSet, HashMap, HashSet};

use compact_str::CompactString;

use crate::{
    errors::{CLResult, CharloomError},
    types::{EncodedSequence, TokenId},
    vocab::{LATIN_PAIRS, MASK_TOKEN, OOV_TOKEN, VocabOptions},
};

/// Ordered table of distinct symbols with stable integer ids.
///
/// Each symbol is a single Unicode character or a reserved token. The table
/// is built once (from a corpus, or from a persisted `vocab.json`) and is
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct CharVocab {
    symbols: Vec<CompactString>,
    index: HashMap<char, TokenId>,
    options: VocabOptions,
    start_id: Option<TokenId>,
}

impl CharVocab {
    /// Build a vocabulary from a corpus.
    ///
    /// The table starts with the reserved prefix dictated by `options`,
    /// optionally followed by the interleaved Latin letter block, followed by
    /// all remaining distinct corpus characters in code-point order, skipping
    /// any already present. Construction is deterministic given the same
    /// corpus and options.
    pub fn build(
        corpus: &str,
        options: VocabOptions,
    ) -> CLResult<Self> {
        let mut symbols = options.reserved_prefix();

        if options.latin_prefix {
            for ch in LATIN_PAIRS.chars() {
                symbols.push(CompactString::from(ch.to_string()));
            }
        }

        let present: HashSet<char> = symbols
            .iter()
            .filter_map(|s| single_char(s))
            .collect();

        let observed: BTreeSet<char> = corpus.chars().collect();
        for ch in observed {
            if !present.contains(&ch) {
                symbols.push(CompactString::from(ch.to_string()));
            }
        }

        Self::from_symbols(symbols, options)
    }

    /// Assemble a vocabulary from an explicit symbol table.
    ///
    /// ## Arguments
    /// * `symbols` - The ordered symbol table; index = id.
    /// * `options` - The reserved-token policy the table must satisfy.
    ///
    /// ## Returns
    /// The vocabulary, or a fatal configuration error: an empty table,
    /// a reserved token absent or misplaced, or a duplicated character.
    pub fn from_symbols(
        symbols: Vec<CompactString>,
        options: VocabOptions,
    ) -> CLResult<Self> {
        if symbols.is_empty() {
            return Err(CharloomError::EmptyVocabulary);
        }

        if options.mask_scheme {
            if symbols.first().map(|s| s.as_str()) != Some(MASK_TOKEN) {
                return Err(CharloomError::MissingReservedToken {
                    token: MASK_TOKEN.to_string(),
                });
            }
            if symbols.get(1).map(|s| s.as_str()) != Some(OOV_TOKEN) {
                return Err(CharloomError::MissingReservedToken {
                    token: OOV_TOKEN.to_string(),
                });
            }
        }

        let start_id = match &options.message_start {
            None => None,
            Some(token) => {
                let id = symbols.iter().position(|s| s == token).ok_or_else(|| {
                    CharloomError::MissingReservedToken {
                        token: token.to_string(),
                    }
                })?;
                Some(id as TokenId)
            }
        };

        let mut index = HashMap::with_capacity(symbols.len());
        for (id, symbol) in symbols.iter().enumerate() {
            if let Some(ch) = single_char(symbol) {
                if index.insert(ch, id as TokenId).is_some() {
                    return Err(CharloomError::VocabConflict(format!(
                        "symbol {ch:?} appears more than once"
                    )));
                }
            }
        }

        Ok(Self {
            symbols,
            index,
            options,
            start_id,
        })
    }

    /// The number of symbols in the vocabulary.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if the vocabulary is empty.
    ///
    /// Construction rejects empty tables, so this is false for any
    /// successfully built vocabulary.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The ordered symbol table; index = id.
    pub fn symbols(&self) -> &[CompactString] {
        &self.symbols
    }

    /// The options the vocabulary was built under.
    pub fn options(&self) -> &VocabOptions {
        &self.options
    }

    /// The mask id, when the mask scheme is active.
    pub fn mask_id(&self) -> Option<TokenId> {
        self.options.mask_scheme.then_some(0)
    }

    /// The OOV id, when the mask scheme is active.
    pub fn oov_id(&self) -> Option<TokenId> {
        self.options.mask_scheme.then_some(1)
    }

    /// The message-start id, when the start token is active.
    pub fn start_id(&self) -> Option<TokenId> {
        self.start_id
    }

    /// The id of a single character, if present.
    pub fn id_for_char(
        &self,
        ch: char,
    ) -> Option<TokenId> {
        self.index.get(&ch).copied()
    }

    /// The symbol for an id, if the id is in range.
    pub fn symbol(
        &self,
        id: TokenId,
    ) -> Option<&str> {
        self.symbols.get(id as usize).map(|s| s.as_str())
    }

    /// Encode a string, one id per character.
    ///
    /// Unknown characters map to the OOV id; without an active mask scheme
    /// an unknown character is an error.
    pub fn encode(
        &self,
        text: &str,
    ) -> CLResult<EncodedSequence> {
        text.chars()
            .map(|ch| match self.index.get(&ch) {
                Some(&id) => Ok(id),
                None => self
                    .oov_id()
                    .ok_or(CharloomError::UnknownSymbol { symbol: ch }),
            })
            .collect()
    }

    /// Decode a sequence of ids back to text.
    ///
    /// Reserved ids render their bracketed names; outside masking paths
    /// they should never be asked for.
    pub fn decode(
        &self,
        ids: &[TokenId],
    ) -> CLResult<String> {
        let mut text = String::with_capacity(ids.len());
        for &id in ids {
            let symbol = self
                .symbol(id)
                .ok_or(CharloomError::TokenOutOfRange { id })?;
            text.push_str(symbol);
        }
        Ok(text)
    }
}

fn single_char(symbol: &str) -> Option<char> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}
