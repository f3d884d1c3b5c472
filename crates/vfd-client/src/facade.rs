//! 主轴门面（SpindleFacade）
//!
//! 宿主运动控制器看到的唯一主轴接口。门面持有当前激活的主轴句柄，
//! 负责 VFD 适配器的激活与停用：
//!
//! - 激活（`select(VFD_SPINDLE_ID)`）：首次激活时记录宿主原有的能力标志，
//!   关闭原有主轴，换入 VFD 句柄并声明可变转速/方向/at-speed 能力；
//!   首次激活还会向驱动器学习转速上限
//! - 停用（选择其他主轴）：关闭 VFD 主轴，恢复原有句柄和能力标志
//! - 复位：先按顺序通知生命周期观察者，再复位 VFD 适配器
//!
//! # 示例
//!
//! ```
//! use vfd_client::{DriverCapabilities, NullSpindle, SpindleFacade, VFD_SPINDLE_ID};
//! use vfd_driver::VfdSpindleBuilder;
//! use vfd_modbus::MockTransport;
//! use vfd_protocol::{GenericProfile, VendorProfile};
//!
//! let vfd = VfdSpindleBuilder::new(VendorProfile::Generic(GenericProfile::default()))
//!     .build(MockTransport::new())
//!     .unwrap();
//! let mut facade = SpindleFacade::new(
//!     Box::new(NullSpindle::new()),
//!     DriverCapabilities::default(),
//!     Box::new(vfd),
//! );
//!
//! assert!(facade.select(VFD_SPINDLE_ID));
//! assert!(facade.is_vfd_active());
//! facade.set_state(true, true, 1000.0);
//! ```

use crate::driver::{DriverCapabilities, SpindleDataRequest, SpindleDriver};
use crate::observer::PluginBanner;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vfd_driver::{
    DriverError, LifecycleHooks, LifecycleObserver, SpindleState, SpindleTelemetry,
};

/// VFD 主轴的编号
pub const VFD_SPINDLE_ID: u8 = 1;

/// 主轴门面
pub struct SpindleFacade {
    /// 当前激活的主轴
    active: Box<dyn SpindleDriver>,
    /// 当前能力标志
    caps: DriverCapabilities,
    /// 未激活时保存的 VFD 句柄（激活时为 `None`）
    vfd: Option<Box<dyn SpindleDriver>>,
    /// VFD 激活期间保存的原有主轴
    previous: Option<Box<dyn SpindleDriver>>,
    /// 首次激活时记录的原有能力标志
    saved_caps: Option<DriverCapabilities>,
    vfd_active: bool,
    init_ok: bool,
    /// 编码器每转脉冲数；大于 0 时遥测来自宿主编码器
    ppr: u32,
    hooks: LifecycleHooks,
}

impl SpindleFacade {
    /// 创建门面
    ///
    /// `host` 为宿主原有的主轴，`vfd` 为 VFD 适配器句柄。
    /// VFD 的插件标识行作为第一个生命周期观察者注册。
    pub fn new(
        host: Box<dyn SpindleDriver>,
        host_caps: DriverCapabilities,
        vfd: Box<dyn SpindleDriver>,
    ) -> Self {
        let mut hooks = LifecycleHooks::new();
        if let Some(banner) = vfd.plugin_banner() {
            hooks.add_observer(Arc::new(PluginBanner::new(banner)));
        }

        Self {
            active: host,
            caps: host_caps,
            vfd: Some(vfd),
            previous: None,
            saved_caps: None,
            vfd_active: false,
            init_ok: false,
            ppr: 0,
            hooks,
        }
    }

    /// 设置编码器每转脉冲数
    pub fn with_ppr(mut self, ppr: u32) -> Self {
        self.ppr = ppr;
        self
    }

    /// 注册生命周期观察者
    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.hooks.add_observer(observer);
    }

    pub fn is_vfd_active(&self) -> bool {
        self.vfd_active
    }

    pub fn capabilities(&self) -> DriverCapabilities {
        self.caps
    }

    /// 当前激活主轴的名称
    pub fn active_name(&self) -> &str {
        self.active.name()
    }

    /// VFD 句柄（无论是否激活）
    fn vfd_handle(&self) -> &dyn SpindleDriver {
        match &self.vfd {
            Some(vfd) => vfd.as_ref(),
            None => self.active.as_ref(),
        }
    }

    /// 选择主轴
    ///
    /// 返回 `false` 表示 VFD 链路不可用。
    pub fn select(&mut self, spindle_id: u8) -> bool {
        if self.vfd_active && spindle_id != VFD_SPINDLE_ID && self.previous.is_some() {
            self.deactivate();
        }

        if !self.vfd_handle().is_ready() {
            warn!("VFD transport is not up, spindle {} not selected", spindle_id);
            return false;
        }

        self.vfd_active = spindle_id == VFD_SPINDLE_ID;
        if self.vfd_active {
            if let Some(vfd) = self.vfd.take() {
                if self.saved_caps.is_none() {
                    self.saved_caps = Some(self.caps);
                }

                self.spindle_off();
                let host = std::mem::replace(&mut self.active, vfd);
                self.previous = Some(host);
                self.caps = DriverCapabilities::VFD;
                info!("VFD spindle activated ({})", self.active.name());
            }

            if !self.init_ok {
                self.init_ok = true;
                if self.active.learn_limits() {
                    debug!("Spindle limits learned on first activation");
                }
            }
        }

        true
    }

    fn deactivate(&mut self) {
        let Some(host) = self.previous.take() else {
            return;
        };

        self.vfd_active = false;
        self.spindle_off();

        let vfd = std::mem::replace(&mut self.active, host);
        self.vfd = Some(vfd);
        if let Some(caps) = self.saved_caps {
            self.caps = caps;
        }
        info!("VFD spindle deactivated, restored {}", self.active.name());
    }

    /// 关闭当前主轴并通知观察者
    pub fn spindle_off(&mut self) {
        self.active.set_state(false, true, 0.0);
        self.hooks.notify_spindle_off();
    }

    /// 宿主复位
    ///
    /// VFD 激活时，被替换下来的宿主主轴同样收到复位。
    pub fn reset(&mut self) {
        self.hooks.notify_reset();
        self.active.reset();
        if let Some(host) = self.previous.as_mut() {
            host.reset();
        }
        if let Some(vfd) = self.vfd.as_mut() {
            vfd.reset();
        }
    }

    /// 重新向驱动器学习转速上限
    ///
    /// # 错误
    /// - `NotActive`: VFD 主轴未激活
    pub fn relearn_limits(&mut self) -> Result<bool, DriverError> {
        if !self.vfd_active {
            return Err(DriverError::NotActive);
        }
        Ok(self.active.learn_limits())
    }

    /// 宿主报告选项
    pub fn report_options(&self, newopt: bool) -> Vec<String> {
        self.hooks.report_options(newopt)
    }

    // ============================================================
    // 主轴操作（转发给当前激活的主轴）
    // ============================================================

    pub fn set_state(&mut self, on: bool, clockwise: bool, rpm: f32) {
        self.active.set_state(on, clockwise, rpm);
    }

    pub fn update_rpm(&mut self, rpm: f32) {
        self.active.update_rpm(rpm);
    }

    pub fn get_state(&mut self) -> SpindleState {
        self.active.get_state()
    }

    /// 遥测数据
    ///
    /// VFD 激活且宿主装有编码器（`ppr > 0`）时，由宿主原有主轴提供。
    pub fn get_telemetry(&mut self, request: SpindleDataRequest) -> SpindleTelemetry {
        if self.vfd_active
            && self.ppr > 0
            && let Some(host) = self.previous.as_mut()
        {
            return host.get_data(request);
        }
        self.active.get_data(request)
    }

    pub fn poll(&mut self) -> usize {
        self.active.poll()
    }
}
