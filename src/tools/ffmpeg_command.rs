use log::debug;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Command;
use thiserror::Error;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";

/// 錯誤訊息中保留的 stderr 行數
const STDERR_TAIL_LINES: usize = 20;

/// 外部工具執行錯誤
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("無法執行 {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} 執行失敗 ({}): {stderr}", describe_exit(.code))]
    NonZeroExit {
        program: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    #[error("無法解析 {program} 輸出: {detail}")]
    Parse {
        program: &'static str,
        detail: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "被訊號終止".to_string(), |c| format!("exit code {c}"))
}

/// 外部工具的輸出
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// ffmpeg / ffprobe 命令建構器
///
/// 所有管線都透過這裡呼叫外部工具：阻塞等待結束、擷取輸出，
/// 非零結束碼轉為 [`ToolError::NonZeroExit`]。
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    program: &'static str,
    args: Vec<OsString>,
}

impl FfmpegCommand {
    /// 建立 ffmpeg 命令（預設覆寫輸出、不讀取 stdin）
    #[must_use]
    pub fn ffmpeg() -> Self {
        Self {
            program: FFMPEG,
            args: vec!["-hide_banner".into(), "-nostdin".into(), "-y".into()],
        }
    }

    #[must_use]
    pub fn ffprobe() -> Self {
        Self {
            program: FFPROBE,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    #[must_use]
    pub fn input(self, path: &Path) -> Self {
        self.arg("-i").arg(path)
    }

    #[must_use]
    pub fn loglevel(self, level: &str) -> Self {
        self.args(["-loglevel", level])
    }

    #[must_use]
    pub const fn program(&self) -> &'static str {
        self.program
    }

    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args);
        cmd
    }

    /// 執行並要求結束碼為 0
    pub fn run(&self) -> Result<ToolOutput, ToolError> {
        let output = self.run_lenient()?;
        if !output.success {
            return Err(ToolError::NonZeroExit {
                program: self.program,
                code: output.code,
                stderr: tail_lines(&output.stderr, STDERR_TAIL_LINES),
            });
        }
        Ok(output)
    }

    /// 執行但不檢查結束碼，僅在無法啟動程序時回傳錯誤
    ///
    /// `ffmpeg -i <file>` 之類只為了讀取診斷輸出的呼叫會以非零碼結束。
    pub fn run_lenient(&self) -> Result<ToolOutput, ToolError> {
        debug!("執行 {} {}", self.program, self.describe_args());

        let output = self
            .build_command()
            .output()
            .map_err(|source| ToolError::Spawn {
                program: self.program,
                source,
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn describe_args(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
