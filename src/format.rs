//! 格式化模块 - 将日志记录渲染为输出文本

use chrono::Local;
use crate::config::Record;

/// 时间戳格式，与终端/文件输出保持一致
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 提交时刻与派发时刻偏差超过该值时，标准格式会额外带上提交时间
const SKEW_THRESHOLD_MS: i64 = 100;

/// 日志格式化器 trait
pub trait Formatter: Send + Sync {
    /// 将一条记录渲染为单行文本（不含换行）
    fn format(&self, record: &Record) -> String;
}

/// 标准格式化器 - 派发时间 + 级别 + 消息
///
/// 派发与提交的偏差超过 100ms 时追加原始提交时间，
/// 便于识别经过缓冲重放或暂停积压的记录。
#[derive(Debug, Default)]
pub struct StandardFormatter;

impl Formatter for StandardFormatter {
    fn format(&self, record: &Record) -> String {
        let now = Local::now();
        let skew = now.signed_duration_since(record.time);
        if skew.num_milliseconds().abs() > SKEW_THRESHOLD_MS {
            format!(
                "{} (submitted {}) [{}] {}",
                now.format(TIMESTAMP_FORMAT),
                record.time.format(TIMESTAMP_FORMAT),
                record.level,
                record.message
            )
        } else {
            format!(
                "{} [{}] {}",
                now.format(TIMESTAMP_FORMAT),
                record.level,
                record.message
            )
        }
    }
}

/// JSON 格式化器 - 每条记录一个 JSON 对象
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record) -> String {
        serde_json::json!({
            "time": record.time.to_rfc3339(),
            "level": record.level,
            "message": record.message,
        })
        .to_string()
    }
}

/// 纯消息格式化器 - 只输出消息文本
#[derive(Debug, Default)]
pub struct MessageFormatter;

impl Formatter for MessageFormatter {
    fn format(&self, record: &Record) -> String {
        record.message.clone()
    }
}

/// 默认格式化器
pub fn default_formatter() -> Box<dyn Formatter> {
    Box::new(StandardFormatter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Level;
    use chrono::Duration;

    #[test]
    fn test_standard_format_fresh_record() {
        let record = Record::new(Level::Info, "hello");
        let line = StandardFormatter.format(&record);
        assert!(line.contains("[INFO]"));
        assert!(line.ends_with("hello"));
        // 新鲜记录不应出现提交时间标注
        assert!(!line.contains("submitted"));
    }

    #[test]
    fn test_standard_format_skewed_record() {
        let mut record = Record::new(Level::Warning, "delayed");
        record.time = record.time - Duration::seconds(5);
        let line = StandardFormatter.format(&record);
        assert!(line.contains("submitted"));
        assert!(line.contains("[WARNING]"));
    }

    #[test]
    fn test_json_format() {
        let record = Record::new(Level::Error, "boom");
        let line = JsonFormatter.format(&record);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["message"], "boom");
        assert!(value["time"].is_string());
    }

    #[test]
    fn test_message_format() {
        let record = Record::new(Level::Debug, "raw message");
        assert_eq!(MessageFormatter.format(&record), "raw message");
    }
}
