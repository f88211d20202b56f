use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 註冊 Ctrl-C 處理器，回傳各流程在階段之間檢查的旗標
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在停止並清理暫存檔...");
    })
    .context("無法設定 Ctrl-C 處理器")?;

    Ok(shutdown_signal)
}

/// 旗標已設定時回傳錯誤
pub fn check_shutdown(shutdown_signal: &AtomicBool, stage: &str) -> Result<()> {
    if shutdown_signal.load(Ordering::SeqCst) {
        bail!("收到中斷信號，停止{stage}");
    }
    Ok(())
}
