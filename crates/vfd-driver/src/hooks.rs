//! 生命周期观察者（Lifecycle Observers）
//!
//! 宿主的复位、选项报告和主轴关闭事件按注册顺序依次通知每个观察者。
//!
//! # 使用示例
//!
//! ```rust
//! use vfd_driver::hooks::{LifecycleHooks, LifecycleObserver};
//! use std::sync::Arc;
//!
//! struct Banner;
//!
//! impl LifecycleObserver for Banner {
//!     fn on_report_options(&self, newopt: bool, report: &mut Vec<String>) {
//!         if !newopt {
//!             report.push("[PLUGIN:EXAMPLE v1.0]".to_string());
//!         }
//!     }
//! }
//!
//! let mut hooks = LifecycleHooks::new();
//! hooks.add_observer(Arc::new(Banner));
//! assert_eq!(hooks.report_options(false), vec!["[PLUGIN:EXAMPLE v1.0]"]);
//! assert!(hooks.report_options(true).is_empty());
//! ```

use std::sync::Arc;

/// 生命周期观察者 Trait
///
/// 所有方法都有空的默认实现，只需覆盖关心的事件。
pub trait LifecycleObserver: Send + Sync {
    /// 宿主复位
    fn on_reset(&self) {}

    /// 宿主报告选项；`newopt == false` 时输出插件标识行
    fn on_report_options(&self, newopt: bool, report: &mut Vec<String>) {
        let _ = (newopt, report);
    }

    /// 主轴被关闭（切换主轴时）
    fn on_spindle_off(&self) {}
}

/// 观察者列表（按注册顺序通知）
#[derive(Default)]
pub struct LifecycleHooks {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl LifecycleHooks {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// 添加观察者
    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    /// 通知复位
    pub fn notify_reset(&self) {
        for observer in &self.observers {
            observer.on_reset();
        }
    }

    /// 收集选项报告
    pub fn report_options(&self, newopt: bool) -> Vec<String> {
        let mut report = Vec::new();
        for observer in &self.observers {
            observer.on_report_options(newopt, &mut report);
        }
        report
    }

    /// 通知主轴关闭
    pub fn notify_spindle_off(&self) {
        for observer in &self.observers {
            observer.on_spindle_off();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl LifecycleObserver for Recorder {
        fn on_reset(&self) {
            self.log.lock().push(format!("{}:reset", self.name));
        }

        fn on_spindle_off(&self) {
            self.log.lock().push(format!("{}:off", self.name));
        }
    }

    #[test]
    fn test_observers_notified_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = LifecycleHooks::new();
        hooks.add_observer(Arc::new(Recorder {
            name: "a",
            log: log.clone(),
        }));
        hooks.add_observer(Arc::new(Recorder {
            name: "b",
            log: log.clone(),
        }));
        assert_eq!(hooks.len(), 2);

        hooks.notify_reset();
        hooks.notify_spindle_off();
        assert_eq!(*log.lock(), vec!["a:reset", "b:reset", "a:off", "b:off"]);
    }

    #[test]
    fn test_default_report_is_empty() {
        let mut hooks = LifecycleHooks::new();
        hooks.add_observer(Arc::new(Recorder {
            name: "a",
            log: Arc::new(Mutex::new(Vec::new())),
        }));
        assert!(hooks.report_options(false).is_empty());
    }
}
