//! relay_logger - 异步日志管线
//!
//! 每个命名 Logger 拥有一条专属派发线程、一个有界 intake 通道和
//! 一个处理器挂载前的环形启动缓冲区。生产者线程只做入队，所有
//! 处理器 I/O 串行发生在派发线程上；支持 pause/unpause/stop 状态
//! 控制与配置变更后的缓冲区重放。

pub mod config;
pub mod buffer;
pub mod format;
pub mod handler;
pub mod logger;
pub mod registry;

// 重新导出主要类型
pub use config::{Level, LevelParseError, Record};
pub use config::{FileConfig, RotateConfig, RotatePeriod, SyslogConfig, TimedConfig};
pub use format::{Formatter, JsonFormatter, MessageFormatter, StandardFormatter};
pub use handler::{
    FileHandler, Handler, HandlerType, MemoryHandler, NullHandler, RotatingFileHandler,
    SyslogHandler, TimedFileHandler, WriteHandler,
};
pub use logger::{Logger, LoggerBuilder};
pub use registry::{LoggerRegistry, RegistryError, DEFAULT_LOGGER_NAME};

// 日志宏 - 第一个参数是目标日志器（没有隐式全局实例）
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Emergency, $($arg)*));
}

#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Alert, $($arg)*));
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Critical, $($arg)*));
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Error, $($arg)*));
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Warning, $($arg)*));
}

#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Notice, $($arg)*));
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Info, $($arg)*));
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => ($crate::__private_log!($logger, $crate::Level::Debug, $($arg)*));
}

#[macro_export]
#[doc(hidden)]
macro_rules! __private_log {
    ($logger:expr, $level:expr, $($arg:tt)*) => {
        $logger.logf($level, format_args!($($arg)*))
    };
}
