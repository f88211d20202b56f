use anyhow::{Context, Result, bail};

/// 秒數格式化為 `HH:MM:SS`
#[must_use]
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, rest) = (total / 3600, total % 3600);
    format!("{:02}:{:02}:{:02}", hours, rest / 60, rest % 60)
}

/// 解析 `HH:MM:SS`、`MM:SS` 或純秒數
pub fn parse_clock_duration(text: &str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        bail!("時間長度不可為空白");
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        bail!("無法解析時間長度: {text}");
    }

    let mut seconds = 0.0;
    for part in &parts {
        let value: f64 = part
            .parse()
            .with_context(|| format!("無法解析時間長度: {text}"))?;
        if value < 0.0 {
            bail!("時間長度不可為負數: {text}");
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}
