//! 多态主轴驱动句柄
//!
//! 宿主持有一个 `Box<dyn SpindleDriver>` 作为当前主轴实现。
//! VFD 适配器和宿主自带的主轴（例如 PWM 主轴）都实现该 trait，
//! 切换主轴即交换句柄。

use std::sync::Arc;
use tracing::trace;
use vfd_driver::{SpindleState, SpindleTelemetry, SystemStatus, VfdSpindle};
use vfd_modbus::ModbusTransport;

/// 主轴能力标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverCapabilities {
    /// 支持可变转速
    pub variable_spindle: bool,
    /// 支持方向控制
    pub spindle_dir: bool,
    /// 支持 at-speed 判断
    pub spindle_at_speed: bool,
}

impl DriverCapabilities {
    /// VFD 主轴声明的能力
    pub const VFD: Self = Self {
        variable_spindle: true,
        spindle_dir: true,
        spindle_at_speed: true,
    };
}

/// 遥测请求类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleDataRequest {
    /// 转速
    Rpm,
    /// 角度位置
    AngularPosition,
    /// 脉冲计数
    Counters,
}

/// 主轴驱动 Trait
pub trait SpindleDriver {
    /// 驱动名称（用于日志）
    fn name(&self) -> &str;

    /// 设置运行状态与目标转速
    fn set_state(&mut self, on: bool, clockwise: bool, rpm: f32);

    /// 运动中更新目标转速
    fn update_rpm(&mut self, rpm: f32);

    /// 查询状态（可能返回上一次的缓存值）
    fn get_state(&mut self) -> SpindleState;

    /// 遥测数据
    fn get_data(&mut self, request: SpindleDataRequest) -> SpindleTelemetry;

    /// 宿主复位
    fn reset(&mut self) {}

    /// 分派异步事件
    fn poll(&mut self) -> usize {
        0
    }

    /// 底层链路是否可用
    fn is_ready(&self) -> bool {
        true
    }

    /// 从设备学习转速上限（首次激活时调用）
    fn learn_limits(&mut self) -> bool {
        false
    }

    /// 插件标识行
    fn plugin_banner(&self) -> Option<&'static str> {
        None
    }
}

impl<T: ModbusTransport> SpindleDriver for VfdSpindle<T> {
    fn name(&self) -> &str {
        self.profile().name()
    }

    fn set_state(&mut self, on: bool, clockwise: bool, rpm: f32) {
        VfdSpindle::set_state(self, on, clockwise, rpm)
    }

    fn update_rpm(&mut self, rpm: f32) {
        VfdSpindle::update_rpm(self, rpm)
    }

    fn get_state(&mut self) -> SpindleState {
        VfdSpindle::get_state(self)
    }

    fn get_data(&mut self, _request: SpindleDataRequest) -> SpindleTelemetry {
        VfdSpindle::get_data(self)
    }

    fn reset(&mut self) {
        VfdSpindle::reset(self)
    }

    fn poll(&mut self) -> usize {
        VfdSpindle::poll(self)
    }

    fn is_ready(&self) -> bool {
        self.is_transport_up()
    }

    fn learn_limits(&mut self) -> bool {
        self.profile().requires_learned_max() && self.query_max_rpm()
    }

    fn plugin_banner(&self) -> Option<&'static str> {
        Some(self.profile().plugin_banner())
    }
}

/// 宿主自带的简单主轴
///
/// 只记录命令；装有编码器时遥测转速取自 [`SystemStatus`]。
#[derive(Debug, Default)]
pub struct NullSpindle {
    state: SpindleState,
    rpm: f32,
    status: Option<Arc<SystemStatus>>,
}

impl NullSpindle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用宿主编码器数据作为遥测来源
    pub fn with_status(status: Arc<SystemStatus>) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// 最近一次命令的转速
    pub fn commanded_rpm(&self) -> f32 {
        self.rpm
    }
}

impl SpindleDriver for NullSpindle {
    fn name(&self) -> &str {
        "host"
    }

    fn set_state(&mut self, on: bool, clockwise: bool, rpm: f32) {
        trace!("host spindle on={} cw={} rpm={}", on, clockwise, rpm);
        self.state.on = on;
        self.state.clockwise = clockwise;
        self.state.at_speed = true;
        self.rpm = rpm;
    }

    fn update_rpm(&mut self, rpm: f32) {
        self.rpm = rpm;
    }

    fn get_state(&mut self) -> SpindleState {
        self.state
    }

    fn get_data(&mut self, _request: SpindleDataRequest) -> SpindleTelemetry {
        let rpm = self
            .status
            .as_ref()
            .and_then(|s| s.encoder_rpm())
            .unwrap_or(self.rpm);
        SpindleTelemetry {
            rpm,
            ..SpindleTelemetry::default()
        }
    }
}
