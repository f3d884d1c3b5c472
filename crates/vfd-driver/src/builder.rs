//! Builder 模式实现
//!
//! 提供链式构造 `VfdSpindle` 实例的便捷方式。

use crate::alarm::{AlarmLog, AlarmSink, RealtimeQueue};
use crate::error::DriverError;
use crate::retry::DEFAULT_MAX_RETRIES;
use crate::spindle::VfdSpindle;
use crate::status::SystemStatus;
use std::sync::Arc;
use tracing::info;
use vfd_modbus::ModbusTransport;
use vfd_protocol::{CommandEncoder, DEFAULT_VFD_ADDRESS, MAX_SLAVE_ADDRESS, VendorProfile};

/// VfdSpindle Builder（链式构造）
///
/// # Example
///
/// ```
/// use vfd_driver::VfdSpindleBuilder;
/// use vfd_modbus::MockTransport;
/// use vfd_protocol::{VendorProfile, Yl620Profile};
///
/// let spindle = VfdSpindleBuilder::new(VendorProfile::Yl620(Yl620Profile::default()))
///     .address(0x01)
///     .at_speed_tolerance(0.05)
///     .max_retries(10)
///     .build(MockTransport::new())
///     .unwrap();
/// assert_eq!(spindle.retry().max_retries(), 10);
/// ```
pub struct VfdSpindleBuilder {
    profile: VendorProfile,
    /// 从站地址（默认 0x01）
    address: u8,
    /// at-speed 容差（<= 0 表示不判断）
    tolerance: f32,
    /// 重试上限
    max_retries: u16,
    /// 编码器每转脉冲数（0 表示无编码器）
    ppr: u32,
    status: Option<Arc<SystemStatus>>,
    alarms: Option<Arc<dyn AlarmSink>>,
    rt_queue: Option<RealtimeQueue>,
}

impl VfdSpindleBuilder {
    pub fn new(profile: VendorProfile) -> Self {
        Self {
            profile,
            address: DEFAULT_VFD_ADDRESS,
            tolerance: 0.0,
            max_retries: DEFAULT_MAX_RETRIES,
            ppr: 0,
            status: None,
            alarms: None,
            rt_queue: None,
        }
    }

    /// 设置从站地址
    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// 设置 at-speed 容差
    pub fn at_speed_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 设置重试上限
    pub fn max_retries(mut self, max_retries: u16) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// 设置编码器每转脉冲数
    pub fn ppr(mut self, ppr: u32) -> Self {
        self.ppr = ppr;
        self
    }

    /// 共享宿主系统状态（默认：已完成启动、无编码器）
    pub fn system_status(mut self, status: Arc<SystemStatus>) -> Self {
        self.status = Some(status);
        self
    }

    /// 报警接收方（默认：[`AlarmLog`]）
    pub fn alarm_sink(mut self, sink: Arc<dyn AlarmSink>) -> Self {
        self.alarms = Some(sink);
        self
    }

    /// 共享实时命令队列
    pub fn realtime_queue(mut self, queue: RealtimeQueue) -> Self {
        self.rt_queue = Some(queue);
        self
    }

    /// 构建适配器
    ///
    /// # 错误
    /// - `InvalidInput`: 地址为 0 或超过 247、容差非有限值、重试上限为 0
    pub fn build<T: ModbusTransport>(self, transport: T) -> Result<VfdSpindle<T>, DriverError> {
        if self.address == 0 || self.address > MAX_SLAVE_ADDRESS {
            return Err(DriverError::InvalidInput(format!(
                "slave address {} out of range 1..={}",
                self.address, MAX_SLAVE_ADDRESS
            )));
        }
        if !self.tolerance.is_finite() {
            return Err(DriverError::InvalidInput(format!(
                "at_speed_tolerance must be finite, got {}",
                self.tolerance
            )));
        }
        if self.max_retries == 0 {
            return Err(DriverError::InvalidInput(
                "max_retries must be at least 1".to_string(),
            ));
        }

        info!(
            "VFD spindle: profile={} address={} tolerance={} retries={}",
            self.profile.name(),
            self.address,
            self.tolerance,
            self.max_retries
        );

        Ok(VfdSpindle::from_parts(
            transport,
            CommandEncoder::new(self.profile, self.address),
            self.tolerance,
            self.max_retries,
            self.ppr,
            self.status
                .unwrap_or_else(|| Arc::new(SystemStatus::running())),
            self.alarms.unwrap_or_else(|| Arc::new(AlarmLog::new())),
            self.rt_queue.unwrap_or_default(),
        ))
    }
}
