//! 日志器注册表 - 显式注入的命名查找表
//!
//! 不提供进程级隐式单例：注册表由最外层组装点创建并向下传递。
//! 注册表自身的锁（dashmap 分片锁）与任何单个 Logger 的锁相互
//! 独立，注册表变更不会阻塞在途派发，反之亦然。

use std::sync::Arc;
use dashmap::DashMap;

use crate::config::Level;
use crate::logger::Logger;

/// 惰性自动创建的默认日志器名称
pub const DEFAULT_LOGGER_NAME: &str = "default";

/// 命名日志器注册表
pub struct LoggerRegistry {
    loggers: DashMap<String, Arc<Logger>>,
    /// 自动创建日志器时使用的级别
    default_level: Level,
}

impl LoggerRegistry {
    /// 创建新的注册表，默认级别 Info
    pub fn new() -> Self {
        Self::with_default_level(Level::Info)
    }

    /// 创建新的注册表并指定自动创建日志器的级别
    pub fn with_default_level(default_level: Level) -> Self {
        Self {
            loggers: DashMap::new(),
            default_level,
        }
    }

    /// 以指定名称和级别创建并注册日志器；重名返回错误
    pub fn create(&self, name: impl Into<String>, level: Level) -> Result<Arc<Logger>, RegistryError> {
        let name = name.into();
        self.register(Logger::new(name, level))
    }

    /// 注册一个已构建的日志器；重名返回错误
    pub fn register(&self, logger: Logger) -> Result<Arc<Logger>, RegistryError> {
        let name = logger.name().to_string();
        match self.loggers.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                // 新实例未进入注册表，立即停掉避免线程泄漏
                logger.stop();
                Err(RegistryError::DuplicateName(name))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                let logger = Arc::new(logger);
                entry.insert(Arc::clone(&logger));
                Ok(logger)
            }
        }
    }

    /// 注册一个日志器，同名的运行实例被替换并停止
    pub fn replace(&self, logger: Logger) -> Arc<Logger> {
        let name = logger.name().to_string();
        let logger = Arc::new(logger);
        if let Some(old) = self.loggers.insert(name, Arc::clone(&logger)) {
            old.stop();
        }
        logger
    }

    /// 按名称查找日志器；不存在返回错误而不是 panic
    pub fn get(&self, name: &str) -> Result<Arc<Logger>, RegistryError> {
        self.loggers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// 默认日志器，首次访问时惰性创建
    pub fn default_logger(&self) -> Arc<Logger> {
        Arc::clone(
            self.loggers
                .entry(DEFAULT_LOGGER_NAME.to_string())
                .or_insert_with(|| {
                    Arc::new(Logger::new(DEFAULT_LOGGER_NAME, self.default_level))
                })
                .value(),
        )
    }

    /// 移除并停止一个日志器（停止其派发线程、关闭全部处理器）
    pub fn remove(&self, name: &str) -> Result<(), RegistryError> {
        match self.loggers.remove(name) {
            Some((_, logger)) => {
                logger.stop();
                Ok(())
            }
            None => Err(RegistryError::NotFound(name.to_string())),
        }
    }

    /// 当前注册的全部名称
    pub fn names(&self) -> Vec<String> {
        self.loggers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }

    /// 停止并移除全部日志器，用于进程收尾
    pub fn shutdown(&self) {
        let names = self.names();
        for name in names {
            if let Some((_, logger)) = self.loggers.remove(&name) {
                logger.stop();
            }
        }
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 注册表操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 查找的名称不存在
    NotFound(String),
    /// 注册时名称已被占用
    DuplicateName(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotFound(name) => write!(f, "日志器不存在: {:?}", name),
            RegistryError::DuplicateName(name) => write!(f, "日志器名称已存在: {:?}", name),
        }
    }
}

impl std::error::Error for RegistryError {}
