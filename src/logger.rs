//! 日志核心模块 - 每个 Logger 一条派发线程的异步管线
//!
//! 生产者只负责把记录投入有界 intake 通道，真正的处理器 I/O
//! 全部串行发生在该 Logger 专属的派发线程上。通道满时生产者
//! 阻塞（背压），不丢数据。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use parking_lot::Mutex;

use crate::buffer::RingBuffer;
use crate::config::{Level, Record};
use crate::handler::Handler;

/// intake 通道容量；写满后 log 调用阻塞而不是丢弃
pub const INTAKE_CAPACITY: usize = 2048;

/// 无处理器时启动缓冲区的默认容量
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// 等待在途记录时的轮询间隔与次数上限（约 1 秒软上限）
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const WAIT_POLL_ROUNDS: usize = 100;

/// 派发线程的状态控制命令
///
/// 状态机：running -> paused -> running（Pause/Unpause 循环），
/// running|paused -> stopped（终态，Stop 之后不再有任何转移）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Unpause,
    Stop,
}

/// Logger 与派发线程共享的状态
struct Shared {
    /// 最低级别（以 u8 原子存储）
    level: AtomicU8,
    /// 处理器列表，仅派发线程调用 handle/close
    handlers: Mutex<Vec<Box<dyn Handler>>>,
    /// 无处理器期间的启动缓冲区
    buffer: Mutex<RingBuffer>,
    /// 已接受的记录数
    count_in: AtomicU64,
    /// 已完成派发周期的记录数
    count_out: AtomicU64,
}

impl Shared {
    fn level(&self) -> Level {
        // 存进去的值一定来自 Level，还原不会失败
        Level::from_index(self.level.load(Ordering::Relaxed)).unwrap_or(Level::Debug)
    }

    /// 完成一条记录的派发周期：投递、入缓冲或被级别抑制
    fn dispatch(&self, record: Record) {
        if self.level().allows(record.level) {
            let mut handlers = self.handlers.lock();
            if handlers.is_empty() {
                // 还没有处理器，暂存等待重放
                self.buffer.lock().push(record);
            } else {
                for handler in handlers.iter_mut() {
                    if handler.level().allows(record.level) {
                        if let Err(e) = handler.handle(&record) {
                            let _ = handler.handle_error(e);
                        }
                    }
                }
            }
        }
        self.count_out.fetch_add(1, Ordering::Release);
    }

    /// 按注册顺序关闭全部处理器，之后列表清空
    fn close_handlers(&self) {
        let mut handlers = self.handlers.lock();
        for handler in handlers.iter_mut() {
            if let Err(e) = handler.close() {
                let _ = handler.handle_error(e);
            }
        }
        handlers.clear();
    }
}

/// 命名日志器
///
/// 构造即启动专属派发线程；`stop` 或 drop 时线程排空剩余记录、
/// 按注册顺序关闭处理器后退出。
pub struct Logger {
    name: String,
    shared: Arc<Shared>,
    intake_tx: Sender<Record>,
    control_tx: Sender<Control>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl Logger {
    /// 以默认缓冲容量创建日志器并启动派发线程
    pub fn new(name: impl Into<String>, level: Level) -> Self {
        LoggerBuilder::new(name).with_level(level).build()
    }

    fn start(name: String, level: Level, buffer_capacity: usize, handlers: Vec<Box<dyn Handler>>) -> Self {
        let shared = Arc::new(Shared {
            level: AtomicU8::new(level as u8),
            handlers: Mutex::new(handlers),
            buffer: Mutex::new(RingBuffer::new(buffer_capacity)),
            count_in: AtomicU64::new(0),
            count_out: AtomicU64::new(0),
        });

        let (intake_tx, intake_rx) = bounded(INTAKE_CAPACITY);
        let (control_tx, control_rx) = unbounded();

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(format!("relay-logger-{}", name))
            .spawn(move || worker_loop(worker_shared, intake_rx, control_rx))
            .expect("无法启动日志派发线程");

        Self {
            name,
            shared,
            intake_tx,
            control_tx,
            worker: Mutex::new(Some(worker)),
            stopped: AtomicBool::new(false),
        }
    }

    /// 日志器名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 当前最低级别
    pub fn level(&self) -> Level {
        self.shared.level()
    }

    /// 提交一条日志记录
    ///
    /// 永不失败：intake 通道满时阻塞调用方（刻意的背压而非丢弃）；
    /// 日志器停止后的调用被静默丢弃。
    pub fn log(&self, level: Level, message: impl Into<String>) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        self.submit(Record::new(level, message));
    }

    /// 以 `format_args!` 提交一条日志记录，供宏使用
    pub fn logf(&self, level: Level, args: std::fmt::Arguments<'_>) {
        self.log(level, args.to_string());
    }

    pub fn emergency(&self, message: impl Into<String>) {
        self.log(Level::Emergency, message);
    }

    pub fn alert(&self, message: impl Into<String>) {
        self.log(Level::Alert, message);
    }

    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.log(Level::Notice, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    /// 统一的入队路径：先计数，再发送
    ///
    /// count_in 在发送完成前递增，等待方先观察到"已接受"
    /// 再观察到"已处理"。
    fn submit(&self, record: Record) {
        self.shared.count_in.fetch_add(1, Ordering::Release);
        if self.intake_tx.send(record).is_err() {
            // 派发线程已退出，回退计数保持在途统计准确
            self.shared.count_out.fetch_add(1, Ordering::Release);
        }
    }

    /// 暂停派发：线程停止从 intake 取新记录，记录继续排队
    /// （受通道容量约束，写满后生产者阻塞）
    pub fn pause(&self) {
        let _ = self.control_tx.send(Control::Pause);
    }

    /// 恢复正常派发
    pub fn unpause(&self) {
        let _ = self.control_tx.send(Control::Unpause);
    }

    /// 修改最低级别，随后重放启动缓冲区
    /// （重放的记录按新的级别/处理器集合重新评估）
    pub fn set_level(&self, level: Level) {
        self.shared.level.store(level as u8, Ordering::Relaxed);
        self.flush_buffer();
    }

    /// 追加一个处理器，随后重放启动缓冲区，
    /// 让处理器挂载之前收到的记录补投给它
    pub fn add_handler(&self, handler: Box<dyn Handler>) {
        self.shared.handlers.lock().push(handler);
        self.flush_buffer();
    }

    /// 移除全部处理器（逐个关闭），随后重放启动缓冲区
    pub fn clear_handlers(&self) {
        {
            let mut handlers = self.shared.handlers.lock();
            for handler in handlers.iter_mut() {
                if let Err(e) = handler.close() {
                    let _ = handler.handle_error(e);
                }
            }
            handlers.clear();
        }
        self.flush_buffer();
    }

    /// 缓冲区重放协议：换入同容量的空缓冲区，
    /// 把取出的记录按原始到达顺序经正常入队路径重新提交
    fn flush_buffer(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let drained = self.shared.buffer.lock().take_all();
        for record in drained {
            self.submit(record);
        }
    }

    /// 当前在途记录数（已接受但尚未完成派发周期）
    pub fn in_flight(&self) -> u64 {
        let count_in = self.shared.count_in.load(Ordering::Acquire);
        let count_out = self.shared.count_out.load(Ordering::Acquire);
        count_in.saturating_sub(count_out)
    }

    /// 等待在途记录归零
    ///
    /// 以 10ms 间隔轮询，最多 100 轮（约 1 秒）后无论是否归零都
    /// 返回。这是协作式关闭下的软保证：慢处理器超过该窗口时，
    /// 剩余在途记录可能在关闭时被放弃。
    pub fn wait_for_unprocessed_records(&self) {
        for _ in 0..WAIT_POLL_ROUNDS {
            if self.in_flight() == 0 {
                return;
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    /// 永久停止日志器（幂等）
    ///
    /// 等待在途记录、通知派发线程排空剩余队列并按注册顺序关闭
    /// 全部处理器（恰好一次），然后汇合线程。stopped 是终态。
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.wait_for_unprocessed_records();
        let _ = self.control_tx.send(Control::Stop);
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 派发线程主循环：在 intake 与 control 之间 select，空闲时阻塞
fn worker_loop(shared: Arc<Shared>, intake_rx: Receiver<Record>, control_rx: Receiver<Control>) {
    loop {
        select! {
            recv(control_rx) -> msg => match msg {
                Ok(Control::Pause) => {
                    if !wait_while_paused(&control_rx) {
                        shutdown(&shared, &intake_rx);
                        return;
                    }
                }
                Ok(Control::Unpause) => {}
                Ok(Control::Stop) | Err(_) => {
                    shutdown(&shared, &intake_rx);
                    return;
                }
            },
            recv(intake_rx) -> record => match record {
                Ok(record) => shared.dispatch(record),
                Err(_) => {
                    // 全部发送端消失，直接收尾
                    shared.close_handlers();
                    return;
                }
            },
        }
    }
}

/// 暂停期间的嵌套等待循环，只消费控制命令
///
/// 返回 false 表示收到 Stop（或控制通道关闭），需要进入停机流程。
fn wait_while_paused(control_rx: &Receiver<Control>) -> bool {
    loop {
        match control_rx.recv() {
            Ok(Control::Unpause) => return true,
            Ok(Control::Pause) => {}
            Ok(Control::Stop) | Err(_) => return false,
        }
    }
}

/// 停机流程：排空 intake 中剩余的记录，再关闭处理器
fn shutdown(shared: &Shared, intake_rx: &Receiver<Record>) {
    while let Ok(record) = intake_rx.try_recv() {
        shared.dispatch(record);
    }
    shared.close_handlers();
}

/// 日志器构建器
pub struct LoggerBuilder {
    name: String,
    level: Level,
    buffer_capacity: usize,
    handlers: Vec<Box<dyn Handler>>,
}

impl LoggerBuilder {
    /// 创建新的构建器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::Info,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            handlers: Vec::new(),
        }
    }

    /// 设置最低级别
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置启动缓冲区容量
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// 预挂载一个处理器
    pub fn add_handler(mut self, handler: Box<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// 构建日志器并启动其派发线程
    pub fn build(self) -> Logger {
        Logger::start(self.name, self.level, self.buffer_capacity, self.handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::MemoryHandler;

    /// 轮询等待内存处理器收到期望数量的记录
    fn wait_for_count(view: &MemoryHandler, expected: usize) {
        for _ in 0..200 {
            if view.len() >= expected {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_level_filtering_scenario() {
        // 日志器 INFO 级别，处理器 DEBUG 级别
        let view = MemoryHandler::new();
        let logger = LoggerBuilder::new("filter")
            .with_level(Level::Info)
            .add_handler(Box::new(view.clone()))
            .build();

        logger.log(Level::Emergency, "em");
        logger.log(Level::Info, "in");
        logger.log(Level::Debug, "de"); // 被日志器级别抑制

        logger.wait_for_unprocessed_records();

        let records = view.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Emergency);
        assert_eq!(records[1].level, Level::Info);
        logger.stop();
    }

    #[test]
    fn test_handler_level_filtering() {
        // 处理器级别比日志器更严格
        let view = MemoryHandler::new().with_level(Level::Error);
        let logger = LoggerBuilder::new("handler-filter")
            .with_level(Level::Debug)
            .add_handler(Box::new(view.clone()))
            .build();

        logger.log(Level::Critical, "keep");
        logger.log(Level::Warning, "skip");
        logger.wait_for_unprocessed_records();

        let records = view.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "keep");
        logger.stop();
    }

    #[test]
    fn test_buffer_replay_order() {
        // 处理器挂载之前的记录必须按原始顺序补投
        let logger = LoggerBuilder::new("replay").with_level(Level::Debug).build();
        for i in 0..5 {
            logger.log(Level::Info, format!("early{}", i));
        }
        logger.wait_for_unprocessed_records();

        let view = MemoryHandler::new();
        logger.add_handler(Box::new(view.clone()));
        logger.wait_for_unprocessed_records();
        wait_for_count(&view, 5);

        let messages: Vec<String> = view.records().iter().map(|r| r.message.clone()).collect();
        assert_eq!(messages, vec!["early0", "early1", "early2", "early3", "early4"]);
        logger.stop();
    }

    #[test]
    fn test_buffer_overflow_keeps_newest() {
        // 容量 3 的缓冲区收到 5 条，只保留最后 3 条（最旧先淘汰）
        let logger = LoggerBuilder::new("overflow")
            .with_level(Level::Debug)
            .with_buffer_capacity(3)
            .build();
        for i in 1..=5 {
            logger.log(Level::Info, format!("m{}", i));
        }
        logger.wait_for_unprocessed_records();

        let view = MemoryHandler::new();
        logger.add_handler(Box::new(view.clone()));
        wait_for_count(&view, 3);

        let messages: Vec<String> = view.records().iter().map(|r| r.message.clone()).collect();
        assert_eq!(messages, vec!["m3", "m4", "m5"]);
        logger.stop();
    }

    #[test]
    fn test_set_level_replays_buffer() {
        let logger = LoggerBuilder::new("setlevel").with_level(Level::Debug).build();
        logger.log(Level::Info, "buffered");
        logger.wait_for_unprocessed_records();

        let view = MemoryHandler::new();
        {
            // 直接塞进处理器列表，绕过 add_handler 的重放
            logger.shared.handlers.lock().push(Box::new(view.clone()));
        }
        logger.set_level(Level::Info);
        wait_for_count(&view, 1);
        assert_eq!(view.records()[0].message, "buffered");
        logger.stop();
    }

    #[test]
    fn test_pause_unpause_preserves_order() {
        let view = MemoryHandler::new();
        let logger = LoggerBuilder::new("pause")
            .with_level(Level::Debug)
            .add_handler(Box::new(view.clone()))
            .build();

        logger.pause();
        // 给派发线程消费 Pause 命令的时间
        thread::sleep(Duration::from_millis(50));

        for i in 0..10 {
            logger.log(Level::Info, format!("queued{}", i));
        }
        thread::sleep(Duration::from_millis(50));
        // 暂停期间不应有任何投递
        assert!(view.is_empty());

        logger.unpause();
        logger.wait_for_unprocessed_records();
        wait_for_count(&view, 10);

        let messages: Vec<String> = view.records().iter().map(|r| r.message.clone()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("queued{}", i)).collect();
        assert_eq!(messages, expected);
        logger.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let view = MemoryHandler::new();
        let logger = LoggerBuilder::new("stop")
            .with_level(Level::Debug)
            .add_handler(Box::new(view.clone()))
            .build();

        logger.log(Level::Info, "before stop");
        logger.stop();
        logger.stop(); // 第二次必须无副作用

        assert_eq!(view.len(), 1);
        // 停止后的日志被静默丢弃
        logger.log(Level::Info, "after stop");
        thread::sleep(Duration::from_millis(20));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_concurrent_producers_keep_relative_order() {
        let view = MemoryHandler::new();
        let logger = Arc::new(
            LoggerBuilder::new("concurrent")
                .with_level(Level::Debug)
                .add_handler(Box::new(view.clone()))
                .build(),
        );

        let mut producers = Vec::new();
        for p in 0..2 {
            let logger = Arc::clone(&logger);
            producers.push(thread::spawn(move || {
                for seq in 0..100 {
                    logger.log(Level::Info, format!("p{} {}", p, seq));
                }
            }));
        }
        for producer in producers {
            producer.join().unwrap();
        }

        logger.wait_for_unprocessed_records();
        wait_for_count(&view, 200);

        let records = view.records();
        assert_eq!(records.len(), 200);

        // 每个生产者自己的 100 条保持相对顺序
        for p in 0..2 {
            let prefix = format!("p{} ", p);
            let seqs: Vec<usize> = records
                .iter()
                .filter_map(|r| r.message.strip_prefix(&prefix))
                .map(|s| s.parse().unwrap())
                .collect();
            assert_eq!(seqs, (0..100).collect::<Vec<usize>>());
        }
        logger.stop();
    }

    #[test]
    fn test_logger_debug_format() {
        // Debug 输出用于诊断，也让 Result<Arc<Logger>, _> 可以直接 unwrap_err 断言
        let logger = Logger::new("debuggable", Level::Notice);
        let rendered = format!("{:?}", logger);
        assert!(rendered.contains("debuggable"));
        assert!(rendered.contains("Notice"));
        logger.stop();
    }

    #[test]
    fn test_counters_track_in_flight() {
        let view = MemoryHandler::new();
        let logger = LoggerBuilder::new("counters")
            .with_level(Level::Debug)
            .add_handler(Box::new(view.clone()))
            .build();

        for _ in 0..50 {
            logger.log(Level::Info, "x");
        }
        logger.wait_for_unprocessed_records();
        assert_eq!(logger.in_flight(), 0);
        assert_eq!(view.len(), 50);
        logger.stop();
    }

    #[test]
    fn test_clear_handlers_then_buffer() {
        let view = MemoryHandler::new();
        let logger = LoggerBuilder::new("clear")
            .with_level(Level::Debug)
            .add_handler(Box::new(view.clone()))
            .build();

        logger.log(Level::Info, "delivered");
        logger.wait_for_unprocessed_records();
        assert_eq!(view.len(), 1);

        logger.clear_handlers();
        logger.log(Level::Info, "buffered again");
        logger.wait_for_unprocessed_records();
        // 没有处理器，这条记录进入缓冲区
        assert_eq!(view.len(), 1);

        let late = MemoryHandler::new();
        logger.add_handler(Box::new(late.clone()));
        wait_for_count(&late, 1);
        assert_eq!(late.records()[0].message, "buffered again");
        logger.stop();
    }
}
