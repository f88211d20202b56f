use anyhow::{Context, Result};
use log::debug;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// concat demuxer 清單中的一個項目
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatEntry {
    pub path: PathBuf,
    /// 顯示秒數（靜態圖片才需要）
    pub duration: Option<f64>,
}

/// ffmpeg concat demuxer 清單
///
/// 語法：
/// ```text
/// file 'clear_scenes/scene_0001.jpg'
/// duration 5
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConcatManifest {
    entries: Vec<ConcatEntry>,
    repeat_last: bool,
}

impl ConcatManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 每個檔案皆使用相同顯示秒數
    #[must_use]
    pub fn with_uniform_duration(paths: &[PathBuf], duration: f64) -> Self {
        let mut manifest = Self::new();
        for path in paths {
            manifest.push(path, Some(duration));
        }
        manifest
    }

    /// 不指定秒數（影片片段）
    #[must_use]
    pub fn from_files(paths: &[PathBuf]) -> Self {
        let mut manifest = Self::new();
        for path in paths {
            manifest.push(path, None);
        }
        manifest
    }

    pub fn push(&mut self, path: impl Into<PathBuf>, duration: Option<f64>) {
        self.entries.push(ConcatEntry {
            path: path.into(),
            duration,
        });
    }

    /// 在結尾再列一次最後一個檔案（不帶 duration）
    ///
    /// concat demuxer 會忽略最後一個項目的 duration，不重複時最後一張圖只顯示一幀。
    #[must_use]
    pub const fn repeat_last_entry(mut self, repeat: bool) -> Self {
        self.repeat_last = repeat;
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[ConcatEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有 duration 的總和
    #[must_use]
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().filter_map(|e| e.duration).sum()
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            let _ = writeln!(text, "file '{}'", escape_path(&entry.path));
            if let Some(duration) = entry.duration {
                let _ = writeln!(text, "duration {duration}");
            }
        }
        if self.repeat_last {
            if let Some(last) = self.entries.last() {
                let _ = writeln!(text, "file '{}'", escape_path(&last.path));
            }
        }
        text
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("無法寫入 concat 清單: {}", path.display()))?;
        debug!("寫入 concat 清單 {} 項: {}", self.len(), path.display());
        Ok(())
    }
}

/// 單引號字串內的 `'` 需寫成 `'\''`
fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}
