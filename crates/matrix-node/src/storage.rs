//! Persistent position storage using RocksDB.

use crate::error::Result;
use matrix_engine::{prepare_commit, MatrixPosition, PlacementCommit, PositionStore, UserId};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;

const POSITION_PREFIX: &[u8] = b"position:";

/// RocksDB-backed matrix position store.
///
/// Each position is a JSON value under `position:{user_id}`, the id
/// zero-padded so that keys sort numerically.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    fn key(user: UserId) -> String {
        format!("position:{:020}", user.value())
    }

    fn encode(position: &MatrixPosition) -> matrix_engine::Result<Vec<u8>> {
        serde_json::to_vec(position).map_err(storage_error)
    }
}

fn storage_error(e: impl std::fmt::Display) -> matrix_engine::Error {
    matrix_engine::Error::Storage(e.to_string())
}

impl PositionStore for Storage {
    fn get(&self, user: UserId) -> matrix_engine::Result<Option<MatrixPosition>> {
        match self.db.get(Self::key(user).as_bytes()).map_err(storage_error)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data).map_err(storage_error)?)),
            None => Ok(None),
        }
    }

    fn positions(&self) -> matrix_engine::Result<Vec<MatrixPosition>> {
        let mut positions = Vec::new();

        let iter = self.db.prefix_iterator(POSITION_PREFIX);
        for item in iter {
            let (key, value) = item.map_err(storage_error)?;
            if key.starts_with(POSITION_PREFIX) {
                let position: MatrixPosition =
                    serde_json::from_slice(&value).map_err(storage_error)?;
                positions.push(position);
            } else {
                break;
            }
        }

        positions.sort_by_key(|p| (p.tree_root, p.level, p.position));
        Ok(positions)
    }

    fn commit(&mut self, commit: &PlacementCommit) -> matrix_engine::Result<()> {
        let parent = prepare_commit(&*self, commit)?;

        // New record and parent slot land in one write batch
        let mut batch = WriteBatch::default();
        if let Some(parent) = parent {
            batch.put(Self::key(parent.user_id).as_bytes(), Self::encode(&parent)?);
        }
        batch.put(
            Self::key(commit.position.user_id).as_bytes(),
            Self::encode(&commit.position)?,
        );
        self.db.write(batch).map_err(storage_error)
    }

    fn set_active(&mut self, user: UserId, active: bool) -> matrix_engine::Result<bool> {
        let mut position = self
            .get(user)?
            .ok_or(matrix_engine::Error::UnknownPosition(user))?;
        if position.is_active == active {
            return Ok(false);
        }
        position.is_active = active;
        self.db
            .put(Self::key(user).as_bytes(), Self::encode(&position)?)
            .map_err(storage_error)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrix_engine::{check_invariants, Error, MatrixEngine, Slot};
    use tempfile::tempdir;

    #[test]
    fn engine_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        let mut engine = MatrixEngine::new(storage);

        engine.place(UserId(1), None).unwrap();
        let b = engine.place(UserId(2), Some(UserId(1))).unwrap();

        let loaded = engine.store().get(UserId(2)).unwrap().unwrap();
        assert_eq!(b, loaded);
        let root = engine.store().get(UserId(1)).unwrap().unwrap();
        assert_eq!(root.child(Slot::Left), Some(UserId(2)));
    }

    #[test]
    fn spillover_persists_across_reopen() {
        let dir = tempdir().unwrap();
        {
            let mut engine = MatrixEngine::new(Storage::open(dir.path()).unwrap());
            engine.place(UserId(1), None).unwrap();
            for user in 2..=5 {
                engine.place(UserId(user), Some(UserId(1))).unwrap();
            }
        }

        let storage = Storage::open(dir.path()).unwrap();
        let e = storage.get(UserId(5)).unwrap().unwrap();
        assert_eq!(e.parent_id, Some(UserId(2)));
        assert_eq!(e.sponsor_id, Some(UserId(1)));
        assert_eq!(e.level, 3);

        let positions = storage.positions().unwrap();
        assert_eq!(positions.len(), 5);
        assert_eq!(check_invariants(&positions), Ok(()));
    }

    #[test]
    fn taken_slot_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let mut storage = Storage::open(dir.path()).unwrap();
        let root = MatrixPosition::root(UserId(1), 0);
        storage
            .commit(&PlacementCommit {
                position: root.clone(),
                claim: None,
            })
            .unwrap();

        let mut engine = MatrixEngine::new(storage);
        let b = engine.place(UserId(2), Some(UserId(1))).unwrap();

        // Replay the same claim for a different user
        let mut stale = b.clone();
        stale.user_id = UserId(3);
        let mut storage = engine.into_store();
        let err = storage
            .commit(&PlacementCommit {
                position: stale,
                claim: Some(matrix_engine::SlotClaim {
                    parent: UserId(1),
                    slot: Slot::Left,
                }),
            })
            .unwrap_err();
        assert_eq!(
            err,
            Error::SlotTaken {
                parent: UserId(1),
                slot: Slot::Left
            }
        );
        assert!(storage.get(UserId(3)).unwrap().is_none());
    }

    #[test]
    fn deactivation_is_persisted() {
        let dir = tempdir().unwrap();
        let mut engine = MatrixEngine::new(Storage::open(dir.path()).unwrap());
        engine.place(UserId(1), None).unwrap();

        assert!(engine.set_active(UserId(1), false).unwrap());
        assert!(engine.position(UserId(1)).unwrap().is_none());
        assert_eq!(
            engine.place(UserId(2), Some(UserId(1))),
            Err(Error::NoSponsorPosition(UserId(1)))
        );
    }
}
