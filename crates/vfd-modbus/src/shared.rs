//! 共享传输句柄
//!
//! 串口只有一个，但会被多个子系统使用（主轴、其他 Modbus 外设）。
//! `SharedTransport` 用 `Arc<Mutex<_>>` 包装具体传输，
//! 每个使用方持有一个克隆，互相之间不假设独占。

use crate::{ModbusRequest, ModbusTransport, RequestId, SendOutcome, TransportEvent};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// 可克隆的共享传输句柄
pub struct SharedTransport<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SharedTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedTransport<T> {
    pub fn new(transport: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    /// 锁定底层传输（测试中用于检查 mock 状态）
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}

impl<T: ModbusTransport> ModbusTransport for SharedTransport<T> {
    fn send(&mut self, id: RequestId, request: ModbusRequest, block: bool) -> SendOutcome {
        self.inner.lock().send(id, request, block)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.inner.lock().poll()
    }

    fn reset(&mut self) {
        self.inner.lock().reset()
    }

    fn is_up(&self) -> bool {
        self.inner.lock().is_up()
    }
}
