use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 按键互斥表
///
/// 为每个键（课程目录）维护一把进程内互斥锁，写入方先取锁再读改写，
/// 保证同一课程的合并不会交错。锁本身从不跨 await 持有。
pub struct LockTable {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// 取出（或创建）某个键对应的锁
    pub fn acquire(&self, key: &str) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().unwrap();
        table
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}
