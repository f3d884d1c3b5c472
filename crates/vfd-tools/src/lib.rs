//! # VFD Tools - 共享配置结构
//!
//! **依赖原则**: 只依赖 `vfd-protocol`，不依赖驱动层
//!
//! ## 包含模块
//!
//! - `config` - TOML 配置文件（从站地址、at-speed 容差、重试上限、厂商配置）

pub mod config;

pub use config::{
    ConfigError, GenericSection, ModbusSection, ProfileSection, SpindleSection, VfdConfig,
};
