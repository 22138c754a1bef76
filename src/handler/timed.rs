//! 按时间轮转的文件日志处理器
//!
//! 文件路径由记录的时间戳推导（按天或按小时），
//! 跨过周期边界的第一条记录触发换文件。

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::handler::{Handler, HandlerType};
use crate::config::{Level, Record, TimedConfig};
use crate::format::{Formatter, default_formatter};

/// 时间触发轮转的文件处理器
pub struct TimedFileHandler {
    config: TimedConfig,
    writer: Option<BufWriter<File>>,
    /// 当前文件对应的周期标签
    current_tag: String,
    level: Level,
    formatter: Box<dyn Formatter>,
}

impl TimedFileHandler {
    /// 创建新的时间轮转处理器，文件在收到第一条记录时才打开
    pub fn new(config: TimedConfig) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        fs::create_dir_all(&config.dir)?;

        Ok(Self {
            config,
            writer: None,
            current_tag: String::new(),
            level: Level::Debug,
            formatter: default_formatter(),
        })
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

    /// 由周期标签推导文件路径
    pub fn path_for_tag(&self, tag: &str) -> PathBuf {
        self.config
            .dir
            .join(format!("{}.{}.log", self.config.prefix, tag))
    }

    /// 确保当前 writer 对应记录所属的周期
    fn ensure_writer(&mut self, record: &Record) -> io::Result<()> {
        let tag = self.config.period.tag(&record.time);
        if self.writer.is_some() && tag == self.current_tag {
            return Ok(());
        }

        if let Some(mut old) = self.writer.take() {
            old.flush()?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for_tag(&tag))?;
        self.writer = Some(BufWriter::new(file));
        self.current_tag = tag;
        Ok(())
    }
}

impl Handler for TimedFileHandler {
    fn handle(&mut self, record: &Record) -> io::Result<()> {
        self.ensure_writer(record)?;
        let line = self.formatter.format(record);
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "处理器已关闭"))?;
        writeln!(writer, "{}", line)
    }

    fn level(&self) -> Level {
        self.level
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn handler_type(&self) -> HandlerType {
        HandlerType::TimedFile
    }
}
