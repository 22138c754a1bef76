//! 日志处理器模块
//!
//! 处理器是日志的最终出口。所有处理器的 I/O 都发生在所属 Logger
//! 的派发线程上，因此 `handle` 直接接收 `&mut self`，无需内部加锁；
//! 若同一个处理器被多个 Logger 共享，需要自行串行化内部状态。

use std::io;
use crate::config::{Level, Record};

/// 日志处理器 trait
///
/// 处理失败不会回传给日志生产者，而是交给同一处理器的
/// `handle_error`（默认写入标准错误后继续）。失败的处理器不会
/// 被自动停用。
pub trait Handler: Send {
    /// 处理一条日志记录
    fn handle(&mut self, record: &Record) -> io::Result<()>;

    /// 处理 `handle` 返回的错误，默认打印到标准错误
    fn handle_error(&mut self, err: io::Error) -> io::Result<()> {
        eprintln!("[{:?}] 处理日志记录失败: {}", self.handler_type(), err);
        Ok(())
    }

    /// 处理器自身的最低级别
    fn level(&self) -> Level;

    /// 关闭处理器并释放资源，由 Logger 在停止时调用且只调用一次
    fn close(&mut self) -> io::Result<()>;

    /// 获取处理器类型
    fn handler_type(&self) -> HandlerType;
}

/// 处理器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerType {
    Null,
    Write,
    Memory,
    File,
    RotatingFile,
    TimedFile,
    Syslog,
}

pub mod null;
pub mod write;
pub mod memory;
pub mod file;
pub mod rotating;
pub mod timed;
pub mod syslog;

pub use null::NullHandler;
pub use write::WriteHandler;
pub use memory::MemoryHandler;
pub use file::FileHandler;
pub use rotating::RotatingFileHandler;
pub use timed::TimedFileHandler;
pub use syslog::SyslogHandler;
