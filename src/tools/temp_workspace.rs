//! 暫存工作區
//!
//! 每次執行建立一個 `.tmp_<name>_<uuid>` 資料夾，所有中間檔都放在裡面。
//! 離開作用域時（成功、錯誤或 panic）一律清理。

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug)]
pub struct TempWorkspace {
    root: PathBuf,
    keep: bool,
}

impl TempWorkspace {
    /// 在 `parent` 底下建立新的暫存資料夾
    ///
    /// 路徑一律轉為絕對路徑，concat 清單中的項目以清單位置為基準解析。
    pub fn create(parent: &Path, name: &str) -> Result<Self> {
        let parent = std::path::absolute(parent)
            .with_context(|| format!("無法解析路徑: {}", parent.display()))?;
        let root = parent.join(format!(".tmp_{name}_{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&root)
            .with_context(|| format!("無法建立暫存資料夾: {}", root.display()))?;
        debug!("建立暫存資料夾: {}", root.display());

        Ok(Self {
            root,
            keep: false,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 工作區內的路徑
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// 保留中間檔（除錯用）
    pub fn keep_on_drop(&mut self, keep: bool) {
        self.keep = keep;
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if self.keep {
            warn!("保留暫存資料夾: {}", self.root.display());
            return;
        }

        if self.root.exists() && fs::remove_dir_all(&self.root).is_err() {
            warn!("無法清理暫存資料夾: {}", self.root.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn failing_stage(workspace: &TempWorkspace) -> Result<()> {
        fs::write(workspace.path("images.txt"), "file 'a.jpg'\n")?;
        fs::write(workspace.path("temp_video.mp4"), b"fake")?;
        bail!("ffmpeg 執行失敗")
    }

    #[test]
    fn test_workspace_removed_on_success() {
        let parent = tempfile::tempdir().unwrap();
        let root;
        {
            let workspace = TempWorkspace::create(parent.path(), "slideshow").unwrap();
            root = workspace.root().to_path_buf();
            fs::write(workspace.path("images.txt"), "x").unwrap();
            assert!(root.exists());
        }
        assert!(!root.exists());
    }

    #[test]
    fn test_workspace_removed_on_error() {
        let parent = tempfile::tempdir().unwrap();

        let (root, result) = {
            let workspace = TempWorkspace::create(parent.path(), "merge").unwrap();
            (workspace.root().to_path_buf(), failing_stage(&workspace))
        };

        assert!(result.is_err());
        assert!(!root.exists());
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workspace_removed_on_panic() {
        let parent = tempfile::tempdir().unwrap();
        let parent_path = parent.path().to_path_buf();

        let outcome = std::panic::catch_unwind(move || {
            let workspace = TempWorkspace::create(&parent_path, "trailer").unwrap();
            fs::write(workspace.path("clip_0.mp4"), b"fake").unwrap();
            panic!("stage exploded");
        });

        assert!(outcome.is_err());
        let leftovers: Vec<_> = fs::read_dir(parent.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_keep_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let root;
        {
            let mut workspace = TempWorkspace::create(parent.path(), "debug").unwrap();
            workspace.keep_on_drop(true);
            root = workspace.root().to_path_buf();
        }
        assert!(root.exists());
    }

    #[test]
    fn test_root_is_absolute() {
        let workspace = TempWorkspace::create(Path::new("."), "relative").unwrap();
        assert!(workspace.root().is_absolute());
    }

    #[test]
    fn test_unique_roots() {
        let parent = tempfile::tempdir().unwrap();
        let a = TempWorkspace::create(parent.path(), "same").unwrap();
        let b = TempWorkspace::create(parent.path(), "same").unwrap();
        assert_ne!(a.root(), b.root());
    }
}
