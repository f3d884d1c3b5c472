//! VFD SDK - Modbus 变频器主轴 Rust SDK
//!
//! 把 Modbus RTU 变频器（VFD）接入运动控制器主轴接口的适配层，
//! 支持通用可配置变频器、Yalang YL620 与 Huanyang（v1/v2）。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 厂商寄存器方言、帧编码/解码、转速换算
//! - **传输层** (`modbus`): Modbus 传输 trait 与测试用 MockTransport
//! - **驱动层** (`driver`): 状态跟踪、请求关联、故障升级与报警
//! - **客户端层** (`client`): 主轴门面、VFD 激活与停用、生命周期观察者
//! - **配置** (`config`): TOML 配置文件
//!
//! # 快速开始
//!
//! ```rust
//! use vfd_sdk::prelude::*;
//!
//! vfd_sdk::init_logger!();
//!
//! let config = VfdConfig::from_toml_str("[profile]\nkind = \"yl620\"\n").unwrap();
//! # let transport = vfd_modbus::MockTransport::new();
//! let mut spindle = vfd_sdk::spindle_from_config(config, transport).unwrap();
//! spindle.set_state(true, true, 12000.0);
//! ```

mod setup;

// Prelude 模块
pub mod prelude;

/// 协议层
pub mod protocol {
    pub use vfd_protocol::*;
}

/// 传输层
pub mod modbus {
    pub use vfd_modbus::*;
}

/// 驱动层
pub mod driver {
    pub use vfd_driver::*;
}

/// 客户端层
pub mod client {
    pub use vfd_client::*;
}

/// 配置
pub mod config {
    pub use vfd_tools::config::*;
}

// --- 用户以此为界 ---

pub use setup::{builder_from_config, facade_from_config, spindle_from_config};

pub use vfd_client::{SpindleFacade, VFD_SPINDLE_ID};
pub use vfd_driver::{DriverError, VfdSpindle, VfdSpindleBuilder};
pub use vfd_modbus::{ModbusTransport, TransportError};
pub use vfd_protocol::{ProtocolError, VendorProfile};
pub use vfd_tools::{ConfigError, VfdConfig};

#[doc(hidden)]
pub mod __private {
    pub use log;
    pub use tracing;
    pub use tracing_log;
    pub use tracing_subscriber;
}

/// 初始化日志
///
/// 安装 `tracing_subscriber::fmt` 订阅者，过滤规则取自 `RUST_LOG`，
/// 未设置时使用给定的默认规则（默认 `info`）；同时把 `log` 记录桥接到 `tracing`。
/// 重复调用是安全的，后续调用不会生效。
///
/// ```
/// vfd_sdk::init_logger!();
/// vfd_sdk::init_logger!("vfd_driver=debug");
/// ```
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger!("info")
    };
    ($default:expr) => {{
        use $crate::__private::tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new($default));
        let subscriber = $crate::__private::tracing_subscriber::fmt()
            .with_env_filter(filter)
            .finish();
        if $crate::__private::tracing::subscriber::set_global_default(subscriber).is_ok() {
            let _ = $crate::__private::tracing_log::LogTracer::builder()
                .with_max_level($crate::__private::log::LevelFilter::Trace)
                .init();
        }
    }};
}
