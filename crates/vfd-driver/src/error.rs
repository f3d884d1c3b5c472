//! 驱动层错误类型定义

use thiserror::Error;
use vfd_modbus::TransportError;
use vfd_protocol::ProtocolError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议编解码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 适配器未激活
    #[error("Spindle adapter is not active")]
    NotActive,

    /// 无效输入（如 NaN 容差、重试上限为 0）
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
