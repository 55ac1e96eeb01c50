//! # Checkpoint Manager

use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    checkpoint::{VOCAB_FILE, WEIGHTS_PREFIX, write_atomic},
    errors::{CLResult, CharloomError},
    transducer::PersistentTransducer,
    vocab::{self, CharVocab, VocabOptions},
};

/// Persists and restores paired weights and vocabulary snapshots, with
/// periodic rotation during long training runs.
///
/// The working checkpoint lives directly in the managed directory; rotated
/// snapshots are subdirectories named `ckpt_<timestamp>[ <loss>]`, retained
/// and never mutated.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager over a checkpoint directory.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// The managed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist the working checkpoint: backend weights plus the paired
    /// vocabulary snapshot.
    pub fn save<M: PersistentTransducer>(
        &self,
        model: &M,
        vocab: &CharVocab,
    ) -> CLResult<()> {
        fs::create_dir_all(&self.dir)?;
        model.save_weights(&self.dir)?;
        write_atomic(
            &self.dir.join(VOCAB_FILE),
            &serde_json::to_vec(vocab.symbols())?,
        )?;
        log::info!("saved checkpoint: {}", self.dir.display());
        Ok(())
    }

    /// Load and validate the paired vocabulary.
    ///
    /// An absent `vocab.json` is fatal; weights are never loaded against a
    /// fallback vocabulary.
    pub fn load_vocab(
        &self,
        options: VocabOptions,
    ) -> CLResult<CharVocab> {
        let path = self.dir.join(VOCAB_FILE);
        if !path.is_file() {
            return Err(CharloomError::CheckpointMissingVocab {
                path: self.dir.clone(),
            });
        }
        vocab::io::load_vocab_path(path, options)
    }

    /// Load the backend weights from the working checkpoint.
    pub fn load_weights<M: PersistentTransducer>(
        &self,
        model: &mut M,
    ) -> CLResult<()> {
        if !self.has_weights()? {
            return Err(CharloomError::CheckpointMissingWeights {
                path: self.dir.clone(),
            });
        }
        model.load_weights(&self.dir)
    }

    /// Check if the working checkpoint has weight files.
    pub fn has_weights(&self) -> CLResult<bool> {
        if !self.dir.is_dir() {
            return Ok(false);
        }
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && entry.file_name().to_string_lossy().starts_with(WEIGHTS_PREFIX)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Snapshot the working checkpoint into a timestamped subdirectory,
    /// labeled with the current loss when given, without touching the
    /// working files.
    ///
    /// ## Returns
    /// The snapshot directory path.
    pub fn rotate(
        &self,
        loss: Option<f32>,
    ) -> CLResult<PathBuf> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CharloomError::External(e.to_string()))?
            .as_secs();

        let base = match loss {
            Some(loss) => format!("{WEIGHTS_PREFIX}_{timestamp} {loss:.4}"),
            None => format!("{WEIGHTS_PREFIX}_{timestamp}"),
        };

        let mut snapshot = self.dir.join(&base);
        let mut n = 1;
        while snapshot.exists() {
            snapshot = self.dir.join(format!("{base}.{n}"));
            n += 1;
        }
        fs::create_dir_all(&snapshot)?;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let keep = name.to_string_lossy();
            if keep.starts_with(WEIGHTS_PREFIX) || keep == VOCAB_FILE {
                fs::copy(entry.path(), snapshot.join(&name))?;
            }
        }

        log::info!("rotated checkpoint snapshot: {}", snapshot.display());
        Ok(snapshot)
    }

    /// The rotated snapshot directories, in name order.
    pub fn snapshots(&self) -> CLResult<Vec<PathBuf>> {
        let mut snapshots = Vec::new();
        if !self.dir.is_dir() {
            return Ok(snapshots);
        }
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with(&format!("{WEIGHTS_PREFIX}_"))
            {
                snapshots.push(entry.path());
            }
        }
        snapshots.sort();
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::{
        checkpoint::WEIGHTS_FILE,
        transducer::{BigramOptions, BigramTransducer},
        vocab::VocabOptions,
    };

    fn trained_pair() -> (BigramTransducer, CharVocab) {
        let vocab = CharVocab::build("abab$", VocabOptions::generator()).unwrap();
        let mut model = BigramOptions::default().init(vocab.len());
        let ids = vocab.encode("abab$").unwrap();
        model
            .update_from_example(&ids[..ids.len() - 1], &ids[1..], None)
            .unwrap();
        (model, vocab)
    }

    #[test]
    fn test_save_and_restore_round_trip() {
        let dir = TempDir::new("ckpt").unwrap();
        let manager = CheckpointManager::new(dir.path());
        let (model, vocab) = trained_pair();

        manager.save(&model, &vocab).unwrap();

        let loaded = manager.load_vocab(VocabOptions::generator()).unwrap();
        assert_eq!(loaded, vocab);

        let mut restored = BigramOptions::default().init(vocab.len());
        manager.load_weights(&mut restored).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn test_missing_vocab_is_fatal() {
        let dir = TempDir::new("ckpt").unwrap();
        let manager = CheckpointManager::new(dir.path());
        let (model, _vocab) = trained_pair();

        // Weights alone do not make a checkpoint.
        fs::create_dir_all(manager.dir()).unwrap();
        model.save_weights(manager.dir()).unwrap();

        assert!(matches!(
            manager.load_vocab(VocabOptions::generator()),
            Err(CharloomError::CheckpointMissingVocab { .. })
        ));
    }

    #[test]
    fn test_missing_weights_is_fatal() {
        let dir = TempDir::new("ckpt").unwrap();
        let manager = CheckpointManager::new(dir.path());
        let (_, vocab) = trained_pair();

        fs::create_dir_all(manager.dir()).unwrap();
        write_atomic(
            &manager.dir().join(VOCAB_FILE),
            &serde_json::to_vec(vocab.symbols()).unwrap(),
        )
        .unwrap();

        let mut model = BigramOptions::default().init(vocab.len());
        assert!(matches!(
            manager.load_weights(&mut model),
            Err(CharloomError::CheckpointMissingWeights { .. })
        ));
    }

    #[test]
    fn test_rotation_snapshots_without_touching_the_working_files() {
        let dir = TempDir::new("ckpt").unwrap();
        let manager = CheckpointManager::new(dir.path());
        let (mut model, vocab) = trained_pair();

        manager.save(&model, &vocab).unwrap();
        let snapshot = manager.rotate(Some(0.4321)).unwrap();

        let name = snapshot.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("ckpt_"));
        assert!(name.ends_with(" 0.4321"));
        assert!(snapshot.join(WEIGHTS_FILE).is_file());
        assert!(snapshot.join(VOCAB_FILE).is_file());

        // Keep training and re-save: the snapshot must not move.
        let frozen = fs::read(snapshot.join(WEIGHTS_FILE)).unwrap();
        let ids = vocab.encode("abab$").unwrap();
        model
            .update_from_example(&ids[..ids.len() - 1], &ids[1..], None)
            .unwrap();
        manager.save(&model, &vocab).unwrap();

        assert_eq!(fs::read(snapshot.join(WEIGHTS_FILE)).unwrap(), frozen);
        assert_ne!(fs::read(manager.dir().join(WEIGHTS_FILE)).unwrap(), frozen);

        assert_eq!(manager.snapshots().unwrap(), vec![snapshot]);
    }

    #[test]
    fn test_same_second_rotations_stay_distinct() {
        let dir = TempDir::new("ckpt").unwrap();
        let manager = CheckpointManager::new(dir.path());
        let (model, vocab) = trained_pair();
        manager.save(&model, &vocab).unwrap();

        let a = manager.rotate(None).unwrap();
        let b = manager.rotate(None).unwrap();
        assert_ne!(a, b);
        assert_eq!(manager.snapshots().unwrap().len(), 2);
    }
}
