use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::error::ServiceError;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn init_image_dir(dir: &str) -> std::io::Result<PathBuf> {
    let path = PathBuf::from(dir);
    fs::create_dir_all(&path)?;
    Ok(path)
}

/// Writes an uploaded image into the flat image directory under its original
/// filename. A duplicate name replaces the previous file. Returns the stored
/// path as persisted on the product row.
pub fn save_image(dir: &str, file_name: &str, data: &[u8]) -> Result<String, ServiceError> {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::validation("image filename is required"))?;

    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ServiceError::validation(
            "image must be a jpg, jpeg, or png file",
        ));
    }

    let dir_path = init_image_dir(dir)
        .map_err(|e| ServiceError::Internal(format!("failed to prepare image directory: {e}")))?;
    let target = dir_path.join(name);
    fs::write(&target, data)
        .map_err(|e| ServiceError::Internal(format!("failed to store image: {e}")))?;
    info!("Stored product image at {}", target.display());
    Ok(target.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    #[test]
    fn stores_image_under_original_filename() {
        test_util::setup();
        let dir = tempfile::tempdir().expect("tempdir");
        let dir_str = dir.path().to_str().expect("utf8 path");
        let stored = save_image(dir_str, "widget.png", b"png-bytes").expect("save");
        assert!(stored.ends_with("widget.png"));
        assert_eq!(fs::read(&stored).expect("read back"), b"png-bytes");
    }

    #[test]
    fn duplicate_filename_replaces_previous_file() {
        test_util::setup();
        let dir = tempfile::tempdir().expect("tempdir");
        let dir_str = dir.path().to_str().expect("utf8 path");
        save_image(dir_str, "widget.png", b"first").expect("first save");
        let stored = save_image(dir_str, "widget.png", b"second").expect("second save");
        assert_eq!(fs::read(&stored).expect("read back"), b"second");
    }

    #[test]
    fn strips_directory_components_from_filename() {
        test_util::setup();
        let dir = tempfile::tempdir().expect("tempdir");
        let dir_str = dir.path().to_str().expect("utf8 path");
        let stored = save_image(dir_str, "../../escape.jpg", b"jpg").expect("save");
        assert!(stored.starts_with(dir_str));
        assert!(stored.ends_with("escape.jpg"));
    }

    #[test]
    fn rejects_unsupported_extensions() {
        test_util::setup();
        let dir = tempfile::tempdir().expect("tempdir");
        let dir_str = dir.path().to_str().expect("utf8 path");
        let err = save_image(dir_str, "notes.txt", b"text").unwrap_err();
        assert_eq!(err.kind(), "validation");
    }
}
