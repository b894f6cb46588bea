//! 窗口事件路由表
//!
//! 操作系统回调只携带一个不透明的窗口句柄，需要路由回拥有它的对象。
//! 路由表由窗口子系统持有：创建窗口时注册，关闭时移除，不使用全局变量。

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::error::{BringupError, Result};

/// 尺寸变化回调，参数为新的宽度和高度（像素）
pub type ResizeHandler = Box<dyn FnMut(u32, u32)>;

/// 窗口 id 到尺寸回调的映射
pub struct HandlerRegistry<K> {
    handlers: HashMap<K, ResizeHandler>,
}

impl<K: Eq + Hash + std::fmt::Debug> HandlerRegistry<K> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// 注册窗口，同一 id 不能注册两次
    pub fn register(&mut self, key: K, handler: ResizeHandler) -> Result<()> {
        if self.handlers.contains_key(&key) {
            return Err(BringupError::Window(format!("window {:?} is already registered", key)));
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// 移除窗口，返回它之前是否已注册
    pub fn unregister(&mut self, key: &K) -> bool {
        self.handlers.remove(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 把尺寸变化分发给对应窗口，未注册的窗口返回 `false`
    pub fn notify_resize(&mut self, key: &K, width: u32, height: u32) -> bool {
        match self.handlers.get_mut(key) {
            Some(handler) => {
                handler(width, height);
                true
            }
            None => false,
        }
    }
}

impl<K: Eq + Hash + std::fmt::Debug> Default for HandlerRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_resize_routed_to_owner() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        let sink = Rc::clone(&seen);
        registry
            .register(1u32, Box::new(move |w, h| sink.borrow_mut().push((1, w, h))))
            .unwrap();
        let sink = Rc::clone(&seen);
        registry
            .register(2u32, Box::new(move |w, h| sink.borrow_mut().push((2, w, h))))
            .unwrap();

        assert!(registry.notify_resize(&2, 800, 600));
        assert!(!registry.notify_resize(&3, 1, 1));
        assert_eq!(*seen.borrow(), vec![(2, 800, 600)]);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = HandlerRegistry::new();

        let sink = Rc::clone(&count);
        registry
            .register("main", Box::new(move |_, _| *sink.borrow_mut() += 1))
            .unwrap();
        assert!(registry.contains(&"main"));

        assert!(registry.unregister(&"main"));
        assert!(!registry.unregister(&"main"));
        assert!(registry.is_empty());
        assert!(!registry.notify_resize(&"main", 10, 10));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = HandlerRegistry::new();
        registry.register(7u64, Box::new(|_, _| {})).unwrap();
        assert!(registry.register(7u64, Box::new(|_, _| {})).is_err());
        assert_eq!(registry.len(), 1);
    }
}
