//! 故障升级状态机（RetryEscalation）
//!
//! ```text
//! Idle ──send──▶ AwaitingResponse ──ok──▶ Idle
//!                       │
//!                     fault
//!          ┌────────────┼─────────────┬──────────────┐
//!     counter < max  counter == max  neutral     cold start
//!          ▼            ▼             ▼              ▼
//!       Retrying    Alarm → Idle   Alarm → Faulted  DeferredAlarm → Faulted
//! ```
//!
//! 计数器在每个会话内只有一个，任何成功响应都会清零。

use tracing::trace;
use vfd_protocol::CommandContext;

pub use vfd_protocol::DEFAULT_MAX_RETRIES;

/// 状态机阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPhase {
    #[default]
    Idle,
    AwaitingResponse,
    Retrying,
    Faulted,
}

/// 故障后的最小恢复动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 重新下发当前命令的运行状态和转速
    ReapplyState,
    /// 重新发起状态查询
    RequeryState,
    /// 无对应恢复动作（仅计数）
    None,
}

impl RecoveryAction {
    /// 失败命令对应的恢复动作
    pub fn for_context(context: CommandContext) -> Self {
        match context {
            CommandContext::SetRunState | CommandContext::SetSpeed => Self::ReapplyState,
            CommandContext::GetSpeed => Self::RequeryState,
            CommandContext::GetMaxSpeed | CommandContext::GetMaxSpeedAlt => Self::None,
        }
    }
}

/// 故障处理决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    /// 复位传输并执行恢复动作
    Retry(RecoveryAction),
    /// 立即报警
    Alarm,
    /// 经实时队列延迟报警（冷启动期间）
    DeferredAlarm,
}

/// 故障升级状态机
#[derive(Debug, Clone)]
pub struct RetryEscalation {
    counter: u16,
    max_retries: u16,
    phase: RetryPhase,
}

impl Default for RetryEscalation {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryEscalation {
    /// 创建状态机（`max_retries` 至少为 1）
    pub fn new(max_retries: u16) -> Self {
        Self {
            counter: 0,
            max_retries: max_retries.max(1),
            phase: RetryPhase::Idle,
        }
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    pub fn max_retries(&self) -> u16 {
        self.max_retries
    }

    pub fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// 发出请求
    pub fn on_request_issued(&mut self) {
        self.phase = RetryPhase::AwaitingResponse;
    }

    /// 收到成功响应：计数器清零
    pub fn on_success(&mut self) {
        self.counter = 0;
        self.phase = RetryPhase::Idle;
    }

    /// 处理通信故障
    ///
    /// - 冷启动：延迟报警，计数器不变
    /// - 中性上下文（`None`）：计数器清零并立即报警
    /// - VFD 命令上下文：计数；达到上限时报警并清零，否则重试
    pub fn on_fault(&mut self, context: Option<CommandContext>, cold_start: bool) -> FaultDecision {
        if cold_start {
            self.phase = RetryPhase::Faulted;
            return FaultDecision::DeferredAlarm;
        }

        let Some(context) = context else {
            self.counter = 0;
            self.phase = RetryPhase::Faulted;
            return FaultDecision::Alarm;
        };

        self.counter = self.counter.saturating_add(1);
        trace!("fault {:?}: retry {}/{}", context, self.counter, self.max_retries);

        if self.counter >= self.max_retries {
            self.counter = 0;
            self.phase = RetryPhase::Idle;
            FaultDecision::Alarm
        } else {
            self.phase = RetryPhase::Retrying;
            FaultDecision::Retry(RecoveryAction::for_context(context))
        }
    }
}
