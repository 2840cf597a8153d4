//! File-backed [`KeyValueStore`] that survives process restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError, StoreFuture},
};

type Entries = BTreeMap<String, String>;

/// Credential entries mirrored to a pretty-printed JSON object on disk.
///
/// Reads are served from memory. Every mutation rewrites the whole file through a sibling
/// `.tmp` file and an atomic rename, so a crash leaves either the old or the new snapshot.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Opens the snapshot at `path`, creating parent directories; a missing or empty file starts
	/// an empty store.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		create_parent(&path)?;

		let entries = read_snapshot(&path)?;

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn flush(&self, entries: &Entries) -> Result<(), StoreError> {
		let json = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode credential snapshot: {e}"),
		})?;
		let staging = self.path.with_extension("tmp");
		let mut file = File::create(&staging).map_err(|e| io_failure("create", &staging, e))?;

		file.write_all(&json).map_err(|e| io_failure("write", &staging, e))?;
		file.sync_all().map_err(|e| io_failure("sync", &staging, e))?;
		drop(file);

		fs::rename(&staging, &self.path).map_err(|e| io_failure("replace", &self.path, e))
	}
}
impl KeyValueStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.entries.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			if entries.get(key) == Some(&value) {
				return Ok(());
			}

			entries.insert(key.to_owned(), value);

			self.flush(&entries)
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut entries = self.entries.write();

			match entries.remove(key) {
				Some(_) => self.flush(&entries),
				None => Ok(()),
			}
		})
	}
}

fn io_failure(action: &str, path: &Path, error: std::io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {error}", path.display()) }
}

fn create_parent(path: &Path) -> Result<(), StoreError> {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() =>
			fs::create_dir_all(parent).map_err(|e| io_failure("create directory", parent, e)),
		_ => Ok(()),
	}
}

fn read_snapshot(path: &Path) -> Result<Entries, StoreError> {
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
		Err(e) => return Err(io_failure("read", path, e)),
	};

	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(Entries::new());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse credential snapshot {}: {e}", path.display()),
	})
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"photo_api_client_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[tokio::test]
	async fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");

		store
			.set("access_token", "persisted".into())
			.await
			.expect("Failed to write fixture entry to file store.");
		store.set("user_data", "{}".into()).await.expect("Failed to write second fixture entry.");
		store.remove("user_data").await.expect("Failed to remove fixture entry.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert_eq!(
			reopened.get("access_token").await.expect("File store reads should succeed."),
			Some("persisted".into()),
		);
		assert_eq!(reopened.get("user_data").await.expect("File store reads should succeed."), None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshot_reports_serialization_error() {
		let path = temp_path();

		fs::write(&path, b"not json").expect("Failed to write corrupt fixture.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshots should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
