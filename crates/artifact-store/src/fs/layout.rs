use std::path::{Path, PathBuf};

pub const HASH_DIR: &str = "sha1";

pub fn blob_dir(root: &Path) -> PathBuf {
    root.join(HASH_DIR)
}

pub fn blob_path(root: &Path, hash: &str) -> PathBuf {
    let mut path = blob_dir(root);
    path.push(hash);
    path
}
