//! Directory-backed store.
//!
//! Each collection is a directory under the data directory and each record is
//! one file in it:
//!
//! ```text
//! <data_dir>/<collection>/.collection   readiness marker
//! <data_dir>/<collection>/<id>.rec      bincode frame { format, fields }
//! ```
//!
//! Records are written to a temp file in the same directory and renamed into
//! place, so a reader never sees a half-written record.
use super::{CollectionStatus, Record, Store};
use crate::errors::Error;
use bincode::{config, Decode, Encode};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

const MARKER_FILE: &str = ".collection";
const RECORD_EXTENSION: &str = "rec";
const RECORD_FORMAT: u8 = 1;

#[derive(Encode, Decode, Debug)]
struct RecordFrame {
    /// Frame layout version.
    format: u8,
    fields: Record,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn collection_dir(&self, name: &str) -> Result<PathBuf, Error> {
        check_name("collection", name)?;
        Ok(self.data_dir.join(name))
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf, Error> {
        check_name("record id", id)?;
        Ok(self
            .collection_dir(collection)?
            .join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    /// Directory of an active collection.
    fn active_dir(&self, collection: &str) -> Result<PathBuf, Error> {
        match self.collection_status(collection)? {
            Some(CollectionStatus::Active) => self.collection_dir(collection),
            Some(status) => Err(err!(
                StoreUnavailable,
                "Collection '{}' is {}",
                collection,
                status
            )),
            None => Err(err!(
                StoreUnavailable,
                "Collection '{}' does not exist",
                collection
            )),
        }
    }
}

/// Names become file names, so only a conservative character set is allowed.
fn check_name(what: &str, name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(err!(InvalidOperation, "Invalid {} '{}'", what, name))
    }
}

fn unavailable(context: String, e: std::io::Error) -> Error {
    Error::StoreUnavailable(format!("{}. {}", context, e))
}

impl Store for FileStore {
    fn create_collection(&self, name: &str) -> Result<bool, Error> {
        let dir = self.collection_dir(name)?;
        let marker = dir.join(MARKER_FILE);
        if marker.exists() {
            return Ok(false);
        }
        std::fs::create_dir_all(&dir)
            .map_err(|e| unavailable(format!("Failed to create '{}'", dir.display()), e))?;
        std::fs::write(&marker, name.as_bytes())
            .map_err(|e| unavailable(format!("Failed to activate '{}'", name), e))?;
        debug!(collection = name, path = %dir.display(), "Created collection directory.");
        Ok(true)
    }

    fn collection_status(&self, name: &str) -> Result<Option<CollectionStatus>, Error> {
        let dir = self.collection_dir(name)?;
        if dir.join(MARKER_FILE).is_file() {
            Ok(Some(CollectionStatus::Active))
        } else if dir.is_dir() {
            Ok(Some(CollectionStatus::Creating))
        } else {
            Ok(None)
        }
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, Error> {
        self.active_dir(collection)?;
        let path = self.record_path(collection, id)?;
        trace!(collection, id, "get");

        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(unavailable(
                    format!("Failed to read '{}'", path.display()),
                    e,
                ))
            }
        };

        let (frame, _): (RecordFrame, usize) =
            bincode::decode_from_slice(&bytes, config::standard())?;
        if frame.format != RECORD_FORMAT {
            return Err(err!(
                Serialization,
                "Unsupported record format {} in '{}'",
                frame.format,
                path.display()
            ));
        }
        Ok(Some(frame.fields))
    }

    fn put(&self, collection: &str, id: &str, record: &Record) -> Result<(), Error> {
        let dir = self.active_dir(collection)?;
        let path = self.record_path(collection, id)?;
        trace!(collection, id, "put");

        let frame = RecordFrame {
            format: RECORD_FORMAT,
            fields: record.clone(),
        };
        let bytes = bincode::encode_to_vec(&frame, config::standard())?;

        let mut file = NamedTempFile::new_in(&dir)
            .map_err(|e| unavailable(format!("Failed to stage '{}'", id), e))?;
        file.write_all(&bytes)
            .map_err(|e| unavailable(format!("Failed to write '{}'", id), e))?;
        file.persist(&path)
            .map_err(|e| unavailable(format!("Failed to persist '{}'", id), e.error))?;
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        self.active_dir(collection)?;
        let path = self.record_path(collection, id)?;
        trace!(collection, id, "delete");

        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(
                format!("Failed to delete '{}'", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, key: &str) -> Record {
        Record::from([
            ("id".to_string(), id.to_string()),
            ("key".to_string(), key.to_string()),
        ])
    }

    #[test]
    fn test_create_collection_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.collection_status("tree").unwrap(), None);
        assert!(store.create_collection("tree").unwrap());
        assert!(!store.create_collection("tree").unwrap());
        assert_eq!(
            store.collection_status("tree").unwrap(),
            Some(CollectionStatus::Active)
        );
    }

    #[test]
    fn test_put_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.create_collection("tree").unwrap();

        store.put("tree", "root", &record("root", "m")).unwrap();
        assert_eq!(
            store.get("tree", "root").unwrap(),
            Some(record("root", "m"))
        );

        store.put("tree", "root", &record("root", "n")).unwrap();
        assert_eq!(
            store.get("tree", "root").unwrap(),
            Some(record("root", "n"))
        );

        store.delete("tree", "root").unwrap();
        store.delete("tree", "root").unwrap();
        assert_eq!(store.get("tree", "root").unwrap(), None);
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        FileStore::new(dir.path())
            .create_collection("tree")
            .unwrap();
        FileStore::new(dir.path())
            .put("tree", "abc-1", &record("abc-1", "k"))
            .unwrap();

        let store = FileStore::new(dir.path());
        assert!(!store.create_collection("tree").unwrap());
        assert_eq!(
            store.get("tree", "abc-1").unwrap(),
            Some(record("abc-1", "k"))
        );
    }

    #[test]
    fn test_collection_without_marker_is_not_active() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("tree")).unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(
            store.collection_status("tree").unwrap(),
            Some(CollectionStatus::Creating)
        );
        let err = store.get("tree", "root").unwrap_err();
        assert!(err.is_session_fatal());
    }

    #[test]
    fn test_invalid_names() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.create_collection("tree").unwrap();
        for id in ["", "../escape", ".collection", "a/b"] {
            let err = store.get("tree", id).unwrap_err();
            assert_eq!(err.code(), 7000, "id {:?}", id);
        }
        assert!(store.create_collection("..").is_err());
    }

    #[test]
    fn test_corrupt_record_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.create_collection("tree").unwrap();
        std::fs::write(dir.path().join("tree").join("root.rec"), [0xff, 0xff]).unwrap();
        let err = store.get("tree", "root").unwrap_err();
        assert_eq!(err.code(), 6000);
    }
}
