//! # VFD Modbus Transport Layer
//!
//! Modbus RTU 传输层抽象，提供统一的收发接口。
//!
//! 帧的串口收发、CRC 校验和重传时序都属于具体传输实现；
//! 本 crate 只定义驱动层看到的边界：
//!
//! - 发送一个带 [`RequestId`] 的请求，可选择阻塞等待结果
//! - 通过 [`ModbusTransport::poll`] 取回异步完成的响应或故障
//! - 复位会话、查询链路是否可用
//!
//! 传输层在整个系统中是共享的单例，见 [`SharedTransport`]。

use thiserror::Error;

pub use vfd_protocol::{CommandContext, ExceptionCode, ModbusFrame, ModbusRequest, RequestId};

pub mod shared;

pub use shared::SharedTransport;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockReply, MockTransport};

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Response timeout")]
    Timeout,
    #[error("Modbus exception: {0:?}")]
    Exception(ExceptionCode),
    #[error("CRC mismatch")]
    Crc,
    #[error("Transport not up")]
    NotUp,
}

/// 传输层事件（响应或故障）
///
/// 响应和故障都原样带回请求时的 ID 和上下文。
/// 不属于任何 VFD 命令的故障（例如总线级错误）`context` 为 `None`，
/// 即"中性"上下文。
#[derive(Debug)]
pub enum TransportEvent {
    /// 收到响应帧
    Response {
        id: RequestId,
        context: CommandContext,
        frame: ModbusFrame,
    },
    /// 通信故障
    Fault {
        id: Option<RequestId>,
        context: Option<CommandContext>,
        error: TransportError,
    },
}

impl TransportEvent {
    /// 关联的请求 ID
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Self::Response { id, .. } => Some(*id),
            Self::Fault { id, .. } => *id,
        }
    }

    /// 是否为成功响应
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response { .. })
    }
}

/// 发送结果
#[derive(Debug)]
pub enum SendOutcome {
    /// 阻塞发送：交换已完成
    Completed(TransportEvent),
    /// 非阻塞发送：结果稍后通过 `poll` 取回
    Pending(RequestId),
}

/// Modbus 传输层 trait
///
/// 所有方法都在主执行上下文中调用，事件的投递顺序与调用顺序一致，
/// 实现方不需要考虑并发回调。
pub trait ModbusTransport {
    /// 发送请求
    ///
    /// `block = true` 时等待响应或故障后返回 `Completed`；
    /// 否则立即返回 `Pending`，结果稍后由 `poll` 产生。
    fn send(&mut self, id: RequestId, request: ModbusRequest, block: bool) -> SendOutcome;

    /// 取出一个已完成的异步事件
    fn poll(&mut self) -> Option<TransportEvent>;

    /// 复位传输会话（丢弃未完成的请求）
    fn reset(&mut self) {}

    /// 链路是否可用
    fn is_up(&self) -> bool {
        true
    }
}

impl<T: ModbusTransport + ?Sized> ModbusTransport for Box<T> {
    fn send(&mut self, id: RequestId, request: ModbusRequest, block: bool) -> SendOutcome {
        (**self).send(id, request, block)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        (**self).poll()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn is_up(&self) -> bool {
        (**self).is_up()
    }
}
