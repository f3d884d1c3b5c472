//! 驱动层模块
//!
//! 本模块提供 VFD 主轴的有状态适配器，包括：
//! - 主轴状态跟踪（命令状态、已编程转速、at-speed 判断）
//! - 请求关联（`RequestId` → 原始请求）
//! - 故障升级状态机（有界重试 → 报警）
//! - 报警投递（立即 / 冷启动期间经实时队列延迟）
//! - 生命周期观察者
//!
//! # 使用场景
//!
//! 适用于直接持有一个传输实例、自行调用 `poll` 的宿主。
//! 需要主轴选择与切换的宿主应使用 `vfd-client` 提供的 `SpindleFacade`。

pub mod alarm;
mod builder;
pub mod command;
mod error;
pub mod hooks;
pub mod retry;
mod spindle;
pub mod state;
pub mod status;

pub use alarm::{Alarm, AlarmLog, AlarmSink, RealtimeQueue, RtCommand};
pub use builder::VfdSpindleBuilder;
pub use command::{CommandMailbox, OutstandingRequests, ParkedState};
pub use error::DriverError;
pub use hooks::{LifecycleHooks, LifecycleObserver};
pub use retry::{DEFAULT_MAX_RETRIES, FaultDecision, RecoveryAction, RetryEscalation, RetryPhase};
pub use spindle::VfdSpindle;
pub use state::{SpindleState, SpindleStateTracker, SpindleTelemetry};
pub use status::SystemStatus;
