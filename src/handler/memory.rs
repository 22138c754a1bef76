//! 内存日志处理器 - 在内存中保留记录副本
//!
//! 主要供测试与内嵌场景使用：克隆出的句柄共享同一份记录存储，
//! 即使原件已交给 Logger，也能随时读取快照。

use std::io;
use std::sync::Arc;
use parking_lot::Mutex;

use crate::handler::{Handler, HandlerType};
use crate::config::{Level, Record};

/// 记录收集处理器
#[derive(Clone)]
pub struct MemoryHandler {
    level: Level,
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self {
            level: Level::Debug,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 设置处理器的最低级别
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 当前已收到记录的快照（按接收顺序）
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// 已收到的记录数
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// 清空已收集的记录
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MemoryHandler {
    fn handle(&mut self, record: &Record) -> io::Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn level(&self) -> Level {
        self.level
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn handler_type(&self) -> HandlerType {
        HandlerType::Memory
    }
}
