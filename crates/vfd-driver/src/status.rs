//! 宿主系统状态
//!
//! 宿主与适配器之间共享的少量标志，使用原子操作读写。

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// 宿主系统状态
///
/// # 字段
///
/// - `cold_start`: 系统处于冷启动阶段（实时命令队列尚不可用）
/// - 编码器转速：宿主装有主轴编码器时由宿主更新，
///   适配器据此覆盖 at-speed 判断
///
/// # 示例
///
/// ```rust
/// use vfd_driver::SystemStatus;
///
/// let status = SystemStatus::new();
/// assert!(status.is_cold_start());
/// status.set_cold_start(false);
/// status.set_encoder_rpm(Some(1200.0));
/// assert_eq!(status.encoder_rpm(), Some(1200.0));
/// ```
#[derive(Debug)]
pub struct SystemStatus {
    cold_start: AtomicBool,
    encoder_present: AtomicBool,
    encoder_rpm: AtomicU32,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStatus {
    /// 创建状态（初始处于冷启动阶段）
    pub fn new() -> Self {
        Self {
            cold_start: AtomicBool::new(true),
            encoder_present: AtomicBool::new(false),
            encoder_rpm: AtomicU32::new(0),
        }
    }

    /// 创建已完成启动的状态
    pub fn running() -> Self {
        let status = Self::new();
        status.set_cold_start(false);
        status
    }

    pub fn is_cold_start(&self) -> bool {
        self.cold_start.load(Ordering::Acquire)
    }

    pub fn set_cold_start(&self, cold_start: bool) {
        self.cold_start.store(cold_start, Ordering::Release);
    }

    /// 编码器测得的转速（无编码器时为 `None`）
    pub fn encoder_rpm(&self) -> Option<f32> {
        if self.encoder_present.load(Ordering::Acquire) {
            Some(f32::from_bits(self.encoder_rpm.load(Ordering::Relaxed)))
        } else {
            None
        }
    }

    pub fn set_encoder_rpm(&self, rpm: Option<f32>) {
        match rpm {
            Some(rpm) => {
                self.encoder_rpm.store(rpm.to_bits(), Ordering::Relaxed);
                self.encoder_present.store(true, Ordering::Release);
            },
            None => self.encoder_present.store(false, Ordering::Release),
        }
    }
}
