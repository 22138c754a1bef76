//! 文件日志处理器 - 单个追加写入文件

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};

use crate::handler::{Handler, HandlerType};
use crate::config::{FileConfig, Level, Record};
use crate::format::{Formatter, default_formatter};

/// 追加写入单个文件的处理器
pub struct FileHandler {
    config: FileConfig,
    writer: BufWriter<File>,
    level: Level,
    formatter: Box<dyn Formatter>,
}

impl FileHandler {
    /// 创建新的文件处理器，必要时创建父目录
    pub fn new(config: FileConfig) -> io::Result<Self> {
        let writer = open_append(&config)?;
        Ok(Self {
            config,
            writer,
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

    /// 当前文件路径
    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }
}

fn open_append(config: &FileConfig) -> io::Result<BufWriter<File>> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.path)?;
    Ok(BufWriter::new(file))
}

impl Handler for FileHandler {
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
        HandlerType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MessageFormatter;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "relay_logger_file_{}_{}.log",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn test_file_handler_append() {
        let path = temp_path("append");
        let _ = fs::remove_file(&path);

        let config = FileConfig { path: path.clone() };
        let mut handler = FileHandler::new(config)
            .unwrap()
            .with_formatter(Box::new(MessageFormatter));

        handler.handle(&Record::new(Level::Info, "line1")).unwrap();
        handler.handle(&Record::new(Level::Info, "line2")).unwrap();
        handler.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "line1\nline2\n");

        let _ = fs::remove_file(&path);
    }
}
