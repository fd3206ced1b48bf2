use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Write `contents` to `path` so readers see either the old file or the new one, never a
/// partial write. The data is synced to disk before the rename.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let mut tmp = path.as_os_str().to_owned();
	tmp.push(".tmp");

	let result = async {
		let mut file = tokio::fs::File::create(&tmp).await?;
		file.write_all(contents).await?;
		file.sync_all().await?;
		drop(file);
		tokio::fs::rename(&tmp, path).await
	}
	.await;

	if result.is_err() {
		let _ = tokio::fs::remove_file(&tmp).await;
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn replaces_existing_file() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("state.json");

		write_atomic(&path, b"one").await.expect("first write");
		write_atomic(&path, b"two").await.expect("second write");

		assert_eq!(tokio::fs::read(&path).await.expect("read"), b"two");
		assert!(!dir.path().join("state.json.tmp").exists());
	}

	#[tokio::test]
	async fn failed_rename_leaves_no_temp_file() {
		let dir = tempfile::tempdir().expect("tempdir");
		// A non-empty directory cannot be replaced by a file.
		let path = dir.path().join("state.json");
		tokio::fs::create_dir(&path).await.expect("mkdir");
		tokio::fs::write(path.join("keep"), b"x").await.expect("write");

		assert!(write_atomic(&path, b"data").await.is_err());
		assert!(!dir.path().join("state.json.tmp").exists());
		assert!(path.join("keep").exists());
	}

	#[tokio::test]
	async fn missing_parent_creates_nothing() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("missing").join("state.json");

		assert!(write_atomic(&path, b"data").await.is_err());
		assert!(!dir.path().join("missing").exists());
	}
}
