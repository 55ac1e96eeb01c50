//! # Common Types

/// Integer id of a vocabulary symbol.
///
/// Ids are stable once assigned for a session; a character vocabulary is
/// small, so `u32` covers any realistic symbol table.
pub type TokenId = u32;

/// A variable-length ordered list of token ids, one per input character.
pub type EncodedSequence = Vec<TokenId>;

/// Unnormalized per-symbol scores over the vocabulary for one position.
///
/// Always exactly vocabulary-size wide.
pub type Logits = Vec<f32>;
