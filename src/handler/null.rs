//! 空日志处理器 - 丢弃全部记录

use std::io;

use crate::handler::{Handler, HandlerType};
use crate::config::{Level, Record};

/// 丢弃所有记录的处理器
pub struct NullHandler {
    level: Level,
}

impl NullHandler {
    pub fn new() -> Self {
        Self { level: Level::Debug }
    }

    /// 设置处理器级别（对丢弃行为无影响，仅用于级别查询）
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Default for NullHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for NullHandler {
    fn handle(&mut self, _record: &Record) -> io::Result<()> {
        Ok(())
    }

    fn level(&self) -> Level {
        self.level
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn handler_type(&self) -> HandlerType {
        HandlerType::Null
    }
}
