//! 主轴状态跟踪
//!
//! [`SpindleStateTracker`] 是命令状态、已编程转速和 at-speed 判断的唯一记录。
//!
//! # at-speed 规则
//!
//! - 容差 `tol <= 0`：任何转速都视为 at-speed
//! - 容差 `tol > 0`：转速落在 `[target / (1 + tol), target * (1 + tol)]` 内才是 at-speed
//! - 每次编程新的目标转速时，at-speed 先置为 `false`，等待下一次遥测

/// 主轴状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpindleState {
    /// 是否运行
    pub on: bool,
    /// 是否顺时针（正转）
    pub clockwise: bool,
    /// 是否达到目标转速
    pub at_speed: bool,
}

impl Default for SpindleState {
    fn default() -> Self {
        Self {
            on: false,
            clockwise: true,
            at_speed: false,
        }
    }
}

/// 主轴遥测数据
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpindleTelemetry {
    /// 最近一次解码得到的转速
    pub rpm: f32,
    /// at-speed 下限
    pub rpm_low_limit: f32,
    /// at-speed 上限
    pub rpm_high_limit: f32,
}

/// 主轴状态跟踪器
#[derive(Debug, Clone)]
pub struct SpindleStateTracker {
    state: SpindleState,
    telemetry: SpindleTelemetry,
    tolerance: f32,
    /// 最近一次成功编程的转速（`None` 表示需要重新编程）
    rpm_programmed: Option<f32>,
    /// 宿主最近一次命令的转速（用于故障恢复时重新下发）
    rpm_commanded: f32,
}

impl SpindleStateTracker {
    pub fn new(tolerance: f32) -> Self {
        Self {
            state: SpindleState::default(),
            telemetry: SpindleTelemetry::default(),
            tolerance,
            rpm_programmed: None,
            rpm_commanded: 0.0,
        }
    }

    pub fn state(&self) -> SpindleState {
        self.state
    }

    pub fn telemetry(&self) -> SpindleTelemetry {
        self.telemetry
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn rpm_programmed(&self) -> Option<f32> {
        self.rpm_programmed
    }

    pub fn rpm_commanded(&self) -> f32 {
        self.rpm_commanded
    }

    /// 记录运行/方向命令
    ///
    /// 方向相对上一次命令发生变化时，清除已编程转速，
    /// 下一次转速命令将被强制下发。返回方向是否变化。
    pub fn command(&mut self, on: bool, clockwise: bool, rpm: f32) -> bool {
        let direction_changed = self.state.clockwise != clockwise;
        if direction_changed {
            self.rpm_programmed = None;
        }
        self.state.on = on;
        self.state.clockwise = clockwise;
        self.rpm_commanded = rpm;
        direction_changed
    }

    /// 记录宿主的目标转速（运动中更新转速时使用）
    pub fn command_rpm(&mut self, rpm: f32) {
        self.rpm_commanded = rpm;
    }

    /// 目标转速是否需要（重新）编程
    pub fn needs_program(&self, rpm: f32) -> bool {
        self.rpm_programmed != Some(rpm)
    }

    /// 编程新的目标转速：重算容差窗口，at-speed 置为 false
    pub fn program_target(&mut self, rpm: f32) {
        self.state.at_speed = false;
        if self.tolerance > 0.0 {
            self.telemetry.rpm_low_limit = rpm / (1.0 + self.tolerance);
            self.telemetry.rpm_high_limit = rpm * (1.0 + self.tolerance);
        }
        self.rpm_programmed = Some(rpm);
    }

    /// 使已编程转速失效（转速写入失败时）
    pub fn invalidate_programmed(&mut self) {
        self.rpm_programmed = None;
    }

    /// 转速是否落在容差窗口内
    pub fn within_window(&self, rpm: f32) -> bool {
        self.tolerance <= 0.0
            || (rpm >= self.telemetry.rpm_low_limit && rpm <= self.telemetry.rpm_high_limit)
    }

    /// 应用解码得到的转速遥测
    pub fn apply_rpm(&mut self, rpm: f32) {
        self.telemetry.rpm = rpm;
        self.state.at_speed = self.within_window(rpm);
    }

    /// 按编码器转速重新判断 at-speed（不改变遥测转速）
    pub fn apply_encoder_rpm(&mut self, rpm: f32) {
        self.state.at_speed = self.within_window(rpm);
    }
}
