//! 写入器日志处理器 - 输出到任意 `io::Write` 目标

use std::io::{self, Write};

use crate::handler::{Handler, HandlerType};
use crate::config::{Level, Record};
use crate::format::{Formatter, default_formatter};

/// 基于任意写入器的日志处理器
pub struct WriteHandler<W: Write + Send> {
    writer: W,
    level: Level,
    formatter: Box<dyn Formatter>,
}

impl<W: Write + Send> WriteHandler<W> {
    /// 创建新的写入器处理器
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            level: Level::Debug,
            formatter: default_formatter(),
        }
    }

    /// 设置处理器的最低级别
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置自定义格式化器
    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }
}

impl WriteHandler<io::Stdout> {
    /// 输出到标准输出的处理器
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl WriteHandler<io::Stderr> {
    /// 输出到标准错误的处理器
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> Handler for WriteHandler<W> {
    fn handle(&mut self, record: &Record) -> io::Result<()> {
        let line = self.formatter.format(record);
        writeln!(self.writer, "{}", line)
    }

    fn level(&self) -> Level {
        self.level
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn handler_type(&self) -> HandlerType {
        HandlerType::Write
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MessageFormatter;
    use std::sync::Arc;
    use parking_lot::Mutex;

    /// 共享字节缓冲，便于测试中回读输出
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_handler_output() {
        let buf = SharedBuf::default();
        let mut handler = WriteHandler::new(buf.clone())
            .with_formatter(Box::new(MessageFormatter));

        handler.handle(&Record::new(Level::Info, "one")).unwrap();
        handler.handle(&Record::new(Level::Error, "two")).unwrap();
        handler.close().unwrap();

        let output = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(output, "one\ntwo\n");
    }

    #[test]
    fn test_write_handler_level() {
        let handler = WriteHandler::new(Vec::new()).with_level(Level::Warning);
        assert_eq!(handler.level(), Level::Warning);
        assert_eq!(handler.handler_type(), HandlerType::Write);
    }
}
