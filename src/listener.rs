//! 构建日志输出
//!
//! 宿主 CI 提供的日志流是按行写入的文本。通知器的每行日志以
//! `Flowdock: ` 开头，同时发出对应的 tracing 事件。

use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const LOG_PREFIX: &str = "Flowdock: ";

/// 构建日志
pub struct BuildListener {
    out: Box<dyn Write + Send>,
}

impl BuildListener {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// 写入内存，返回共享缓冲区（测试和嵌入场景使用）
    pub fn buffered() -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    /// 原样写入一行
    pub fn println(&mut self, line: &str) {
        // 日志写失败不能影响构建
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }

    /// 写入带 `Flowdock: ` 前缀的一行
    pub fn log(&mut self, message: &str) {
        info!("{}", message);
        self.println(&format!("{}{}", LOG_PREFIX, message));
    }

    /// 写入失败原因和底层错误，各占一行
    pub fn error(&mut self, reason: &str, err: &dyn std::fmt::Display) {
        warn!(reason = reason, error = %err, "Flowdock notification error");
        self.println(&format!("{}{}", LOG_PREFIX, reason));
        self.println(&format!("{}{}", LOG_PREFIX, err));
    }
}

/// 共享的内存日志缓冲区
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(|l| l.to_string()).collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
