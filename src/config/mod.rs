//! 配置模块 - 日志级别、日志记录与各处理器配置

use chrono::{DateTime, Local};
use serde::{Serialize, Deserialize};
use std::path::PathBuf;

/// 日志级别 - 按严重程度排序（数值越小越严重）
///
/// 与 syslog 的 severity 完全对应，过滤规则为
/// `record.level <= filter.level`（数值比较）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Level {
    /// 全部级别，按严重程度排列
    pub const ALL: [Level; 8] = [
        Level::Emergency,
        Level::Alert,
        Level::Critical,
        Level::Error,
        Level::Warning,
        Level::Notice,
        Level::Info,
        Level::Debug,
    ];

    /// 规范名称（大写）
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Emergency => "EMERGENCY",
            Level::Alert => "ALERT",
            Level::Critical => "CRITICAL",
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Notice => "NOTICE",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// 从数值还原级别（0..=7）
    pub fn from_index(index: u8) -> Option<Level> {
        Level::ALL.get(index as usize).copied()
    }

    /// 判断某条记录在当前过滤级别下是否应该被处理
    pub fn allows(&self, record_level: Level) -> bool {
        record_level <= *self
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = LevelParseError;

    /// 解析级别：接受大小写不敏感的名称（"DEBUG".."EMERGENCY"）
    /// 以及数字字符串 "0".."7"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "EMERGENCY" => Ok(Level::Emergency),
            "ALERT" => Ok(Level::Alert),
            "CRITICAL" => Ok(Level::Critical),
            "ERROR" => Ok(Level::Error),
            "WARNING" => Ok(Level::Warning),
            "NOTICE" => Ok(Level::Notice),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            // 数字形式只接受纯数字串，"+3"、"-1" 之类一律拒绝
            _ if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) => trimmed
                .parse::<u8>()
                .ok()
                .and_then(Level::from_index)
                .ok_or_else(|| LevelParseError(s.to_string())),
            _ => Err(LevelParseError(s.to_string())),
        }
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 级别解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelParseError(pub String);

impl std::fmt::Display for LevelParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "无法解析日志级别: {:?}", self.0)
    }
}

impl std::error::Error for LevelParseError {}

/// 日志记录 - 一条不可变的日志事件
///
/// 由 Logger 在提交时创建，之后不再修改；
/// 所有权在派发前归创建它的 Logger 独有。
#[derive(Debug, Clone)]
pub struct Record {
    /// 提交时刻（墙钟时间）
    pub time: DateTime<Local>,
    /// 严重级别
    pub level: Level,
    /// 已格式化的消息文本
    pub message: String,
}

impl Record {
    /// 以当前时间创建一条记录
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            message: message.into(),
        }
    }
}

/// 单文件日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// 日志文件路径（追加写入）
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./logs/app.log"),
        }
    }
}

/// 按大小轮转的文件日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotateConfig {
    /// 当前日志文件路径
    pub path: PathBuf,
    /// 单文件最大字节数，超过即轮转
    pub max_size: u64,
    /// 保留的编号备份数量（path.1 .. path.N），0 表示直接截断
    pub backup_count: usize,
}

impl RotateConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.max_size == 0 {
            return Err("配置错误: 轮转大小不能为 0".to_string());
        }
        if self.backup_count > 1000 {
            return Err("配置错误: 备份数量过多 (最大 1000)".to_string());
        }
        Ok(())
    }
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./logs/app.log"),
            max_size: 10 * 1024 * 1024, // 10MB
            backup_count: 5,
        }
    }
}

/// 时间轮转周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotatePeriod {
    /// 按天轮转
    Daily,
    /// 按小时轮转
    Hourly,
}

impl RotatePeriod {
    /// 根据记录时间戳生成文件名标签
    pub fn tag(&self, time: &DateTime<Local>) -> String {
        match self {
            RotatePeriod::Daily => time.format("%Y-%m-%d").to_string(),
            RotatePeriod::Hourly => time.format("%Y-%m-%d_%H").to_string(),
        }
    }
}

/// 按时间轮转的文件日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedConfig {
    /// 日志目录
    pub dir: PathBuf,
    /// 文件名前缀，最终文件为 `<dir>/<prefix>.<标签>.log`
    pub prefix: String,
    /// 轮转周期
    pub period: RotatePeriod,
}

impl TimedConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.prefix.is_empty() {
            return Err("配置错误: 文件名前缀不能为空".to_string());
        }
        if self.prefix.contains(std::path::is_separator) {
            return Err("配置错误: 文件名前缀不能包含路径分隔符".to_string());
        }
        Ok(())
    }
}

impl Default for TimedConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./logs"),
            prefix: "app".to_string(),
            period: RotatePeriod::Daily,
        }
    }
}

/// syslog 日志配置（RFC 3164，UDP）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyslogConfig {
    /// syslog 服务器地址
    pub server_addr: String,
    /// syslog 服务器端口
    pub server_port: u16,
    /// facility 编号（0..=23），PRI = facility * 8 + severity
    pub facility: u8,
    /// 程序标签，为空时取当前可执行文件名
    pub tag: String,
}

impl SyslogConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server_addr.is_empty() {
            return Err("配置错误: syslog 服务器地址不能为空".to_string());
        }
        if self.facility > 23 {
            return Err(format!("配置错误: facility 超出范围 ({}，最大 23)", self.facility));
        }
        Ok(())
    }
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1".to_string(),
            server_port: 514,
            facility: 1, // user-level
            tag: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_level_ordering() {
        // 数值越小越严重
        assert!(Level::Emergency < Level::Debug);
        assert!(Level::Error < Level::Warning);

        // Info 级别的过滤器
        assert!(Level::Info.allows(Level::Emergency));
        assert!(Level::Info.allows(Level::Info));
        assert!(!Level::Info.allows(Level::Debug));
    }

    #[test]
    fn test_level_parse_names() {
        assert_eq!(Level::from_str("DEBUG").unwrap(), Level::Debug);
        assert_eq!(Level::from_str("debug").unwrap(), Level::Debug);
        assert_eq!(Level::from_str("Emergency").unwrap(), Level::Emergency);
        assert_eq!(Level::from_str(" warning ").unwrap(), Level::Warning);
    }

    #[test]
    fn test_level_parse_numeric() {
        assert_eq!(Level::from_str("0").unwrap(), Level::Emergency);
        assert_eq!(Level::from_str("7").unwrap(), Level::Debug);
        assert!(Level::from_str("8").is_err());
        assert!(Level::from_str("fatal").is_err());

        // 带符号或混入其他字符的数字形式不属于 "0".."7" 的解析面
        assert!(Level::from_str("+3").is_err());
        assert!(Level::from_str("-1").is_err());
        assert!(Level::from_str("3a").is_err());
        assert!(Level::from_str("").is_err());
    }

    #[test]
    fn test_level_roundtrip() {
        // 每个级别 Display 后再解析必须得到同一个值
        for level in Level::ALL {
            let text = level.to_string();
            assert_eq!(Level::from_str(&text).unwrap(), level);
        }
    }

    #[test]
    fn test_level_serde_roundtrip() {
        for level in Level::ALL {
            let json = serde_json::to_string(&level).unwrap();
            let back: Level = serde_json::from_str(&json).unwrap();
            assert_eq!(back, level);
        }
        assert_eq!(serde_json::to_string(&Level::Notice).unwrap(), "\"NOTICE\"");
    }

    #[test]
    fn test_config_validation() {
        let mut rotate = RotateConfig::default();
        assert!(rotate.validate().is_ok());
        rotate.max_size = 0;
        assert!(rotate.validate().is_err());

        let mut syslog = SyslogConfig::default();
        assert!(syslog.validate().is_ok());
        syslog.facility = 24;
        assert!(syslog.validate().is_err());

        let mut timed = TimedConfig::default();
        assert!(timed.validate().is_ok());
        timed.prefix.clear();
        assert!(timed.validate().is_err());
    }
}
