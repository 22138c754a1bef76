//! 启动缓冲区 - 固定容量环形缓冲
//!
//! Logger 在没有任何处理器时用它暂存已通过级别过滤的记录，
//! 待配置变更后按原始到达顺序重放。满时覆盖最旧的记录。

use crate::config::Record;

/// 固定容量环形缓冲区（head + len 下标式实现）
pub struct RingBuffer {
    slots: Vec<Option<Record>>,
    /// 最旧记录所在下标
    head: usize,
    /// 当前记录数
    len: usize,
}

impl RingBuffer {
    /// 创建指定容量的缓冲区，容量至少为 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            head: 0,
            len: 0,
        }
    }

    /// 追加一条记录；缓冲区已满时覆盖最旧的一条
    pub fn push(&mut self, record: Record) {
        let capacity = self.slots.len();
        if self.len < capacity {
            let tail = (self.head + self.len) % capacity;
            self.slots[tail] = Some(record);
            self.len += 1;
        } else {
            // 覆盖最旧记录，head 前移
            self.slots[self.head] = Some(record);
            self.head = (self.head + 1) % capacity;
        }
    }

    /// 按到达顺序取走全部记录，缓冲区恢复为空
    pub fn take_all(&mut self) -> Vec<Record> {
        let capacity = self.slots.len();
        let mut drained = Vec::with_capacity(self.len);
        for i in 0..self.len {
            let index = (self.head + i) % capacity;
            if let Some(record) = self.slots[index].take() {
                drained.push(record);
            }
        }
        self.head = 0;
        self.len = 0;
        drained
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
