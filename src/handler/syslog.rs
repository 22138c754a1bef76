//! syslog 日志处理器 - 通过 UDP 按 RFC 3164 转发
//!
//! 本库的级别枚举与 syslog severity 一一对应，
//! PRI 直接由 facility * 8 + severity 计算。

use std::io;
use std::net::UdpSocket;
use once_cell::sync::Lazy;

use crate::handler::{Handler, HandlerType};
use crate::config::{Level, Record, SyslogConfig};
use crate::format::{Formatter, MessageFormatter};

/// 默认程序标签：当前可执行文件名
static DEFAULT_TAG: Lazy<String> = Lazy::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "relay_logger".to_string())
});

/// 转发到本地或远程 syslog 的处理器
pub struct SyslogHandler {
    socket: UdpSocket,
    tag: String,
    facility: u8,
    level: Level,
    /// 只负责渲染 MSG 部分；PRI/时间戳/标签由协议固定
    formatter: Box<dyn Formatter>,
}

impl SyslogHandler {
    /// 创建新的 syslog 处理器并连接到目标服务器
    pub fn new(config: SyslogConfig) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect((config.server_addr.as_str(), config.server_port))?;

        let tag = if config.tag.is_empty() {
            DEFAULT_TAG.clone()
        } else {
            config.tag.clone()
        };

        Ok(Self {
            socket,
            tag,
            facility: config.facility,
            level: Level::Debug,
            formatter: Box::new(MessageFormatter),
        })
    }

    /// 设置处理器的最低级别
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置 MSG 部分的自定义格式化器
    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// 组装 RFC 3164 报文
    fn encode(&self, record: &Record) -> String {
        let pri = self.facility * 8 + record.level as u8;
        format!(
            "<{}>{} {}[{}]: {}",
            pri,
            record.time.format("%b %e %H:%M:%S"),
            self.tag,
            std::process::id(),
            self.formatter.format(record)
        )
    }
}

impl Handler for SyslogHandler {
    fn handle(&mut self, record: &Record) -> io::Result<()> {
        let packet = self.encode(record);
        self.socket.send(packet.as_bytes())?;
        Ok(())
    }

    fn level(&self) -> Level {
        self.level
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn handler_type(&self) -> HandlerType {
        HandlerType::Syslog
    }
}
