//! 按大小轮转的文件日志处理器
//!
//! 当前文件超过 `max_size` 时轮转：path -> path.1 -> path.2 ...
//! 最多保留 `backup_count` 个编号备份，最旧的被删除。

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::handler::{Handler, HandlerType};
use crate::config::{Level, Record, RotateConfig};
use crate::format::{Formatter, default_formatter};

/// 大小触发轮转的文件处理器
pub struct RotatingFileHandler {
    config: RotateConfig,
    writer: Option<BufWriter<File>>,
    /// 当前文件已写入的字节数
    written: u64,
    level: Level,
    formatter: Box<dyn Formatter>,
}

impl RotatingFileHandler {
    /// 创建新的轮转文件处理器
    pub fn new(config: RotateConfig) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let (writer, written) = open_current(&config)?;
        Ok(Self {
            config,
            writer: Some(writer),
            written,
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

    /// 编号备份的路径：path.1、path.2 ...
    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.config.path.as_os_str().to_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    /// 执行一次轮转
    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        if self.config.backup_count == 0 {
            // 没有备份位，直接截断当前文件
            fs::File::create(&self.config.path)?;
        } else {
            // 依次后移编号备份，最旧的被删除
            let oldest = self.backup_path(self.config.backup_count);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.config.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.config.path, self.backup_path(1))?;
        }

        let (writer, written) = open_current(&self.config)?;
        self.writer = Some(writer);
        self.written = written;
        Ok(())
    }
}

fn open_current(config: &RotateConfig) -> io::Result<(BufWriter<File>, u64)> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)?;
    let written = file.metadata()?.len();
    Ok((BufWriter::new(file), written))
}

impl Handler for RotatingFileHandler {
    fn handle(&mut self, record: &Record) -> io::Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');

        if self.written > 0 && self.written + line.len() as u64 > self.config.max_size {
            self.rotate()?;
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "处理器已关闭"))?;
        writer.write_all(line.as_bytes())?;
        self.written += line.len() as u64;
        Ok(())
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
        HandlerType::RotatingFile
    }
}
