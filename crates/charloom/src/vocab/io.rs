//! # Vocabulary IO
//!
//! A persisted vocabulary is a JSON array of symbol strings, index = id,
//! written and read verbatim. The file must be co-located with its paired
//! weight checkpoint; see [`crate::checkpoint`].

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use compact_str::CompactString;

use crate::{
    errors::CLResult,
    vocab::{CharVocab, VocabOptions},
};

/// Write a vocabulary as a JSON symbol array.
pub fn write_vocab<W: Write>(
    vocab: &CharVocab,
    writer: W,
) -> CLResult<()> {
    serde_json::to_writer(writer, vocab.symbols())?;
    Ok(())
}

/// Save a vocabulary to a `vocab.json` file.
pub fn save_vocab_path<P: AsRef<Path>>(
    vocab: &CharVocab,
    path: P,
) -> CLResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    write_vocab(vocab, writer)
}

/// Read a vocabulary from a JSON symbol array.
///
/// ## Arguments
/// * `reader` - the JSON source.
/// * `options` - the reserved-token policy the table must satisfy.
///
/// ## Returns
/// The vocabulary, or a fatal configuration error when the persisted table
/// is empty or lacks the reserved tokens the active options expect.
pub fn read_vocab<R: Read>(
    reader: R,
    options: VocabOptions,
) -> CLResult<CharVocab> {
    let symbols: Vec<CompactString> = serde_json::from_reader(reader)?;
    CharVocab::from_symbols(symbols, options)
}

/// Load a vocabulary from a `vocab.json` file.
pub fn load_vocab_path<P: AsRef<Path>>(
    path: P,
    options: VocabOptions,
) -> CLResult<CharVocab> {
    let reader = BufReader::new(File::open(path)?);
    read_vocab(reader, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CharloomError;

    #[test]
    fn test_vocab_json_round_trip() {
        let vocab = CharVocab::build("hello world$\n", VocabOptions::generator()).unwrap();

        let mut buf = Vec::new();
        write_vocab(&vocab, &mut buf).unwrap();

        let loaded = read_vocab(buf.as_slice(), VocabOptions::generator()).unwrap();
        assert_eq!(loaded, vocab);
    }

    #[test]
    fn test_vocab_json_is_a_plain_string_array() {
        let vocab = CharVocab::build("ab", VocabOptions::rater()).unwrap();

        let mut buf = Vec::new();
        write_vocab(&vocab, &mut buf).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            r#"["[MASK]","[UNK]","a","b"]"#
        );
    }

    #[test]
    fn test_read_rejects_empty_array() {
        assert!(matches!(
            read_vocab("[]".as_bytes(), VocabOptions::rater()),
            Err(CharloomError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_read_rejects_missing_reserved_tokens() {
        assert!(matches!(
            read_vocab(r#"["a","b","c"]"#.as_bytes(), VocabOptions::rater()),
            Err(CharloomError::MissingReservedToken { .. })
        ));
    }
}
