//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use vfd_sdk::prelude::*;
//! ```

// 客户端层（推荐使用）
pub use vfd_client::{
    DriverCapabilities, NullSpindle, SpindleDataRequest, SpindleDriver, SpindleFacade,
    VFD_SPINDLE_ID,
};

// 驱动层
pub use vfd_driver::{
    Alarm, AlarmLog, AlarmSink, LifecycleObserver, RealtimeQueue, SpindleState,
    SpindleTelemetry, SystemStatus, VfdSpindle, VfdSpindleBuilder,
};

// 传输层（常用 Trait）
pub use vfd_modbus::{ModbusTransport, SharedTransport};

// 协议层
pub use vfd_protocol::{GenericProfile, HuanyangGeneration, VendorProfile, Yl620Profile};

// 配置
pub use vfd_tools::VfdConfig;

// 错误类型
pub use vfd_driver::DriverError;
pub use vfd_modbus::TransportError;
pub use vfd_protocol::ProtocolError;
pub use vfd_tools::ConfigError;
