//! VFD 主轴适配器
//!
//! [`VfdSpindle`] 持有一个会话的全部可变状态：状态跟踪、已学习的转速上限、
//! 故障计数器、在途请求表和转速邮箱。所有方法都在宿主主执行上下文中调用，
//! 传输层事件通过 [`VfdSpindle::poll`] 在同一上下文中分派，因此无需加锁。
//!
//! # 命令流程
//!
//! ```text
//! set_state ──▶ 运行状态写入（阻塞）──成功──▶ 转速写入（阻塞，去重）
//! update_rpm ─▶ 转速写入（非阻塞，去重）
//! get_state ──▶ 转速查询（非阻塞）──▶ 立即返回上一次的状态
//! ```
//!
//! 同一时刻至多一条命令在途。发起新命令前先分派已到达的事件；
//! 命令仍未完成时，运行状态和转速进入 [`CommandMailbox`]，在 `poll` 中补发。
//!
//! # 故障恢复
//!
//! 故障处理只记录待执行的恢复动作，由公开操作在返回前循环执行，
//! 直到成功、报警或延迟报警。恢复不会重入，调用栈深度与重试上限无关。

use crate::alarm::{Alarm, AlarmSink, RealtimeQueue, RtCommand};
use crate::command::{CommandMailbox, OutstandingRequests, ParkedState};
use crate::error::DriverError;
use crate::retry::{FaultDecision, RecoveryAction, RetryEscalation};
use crate::state::{SpindleState, SpindleStateTracker, SpindleTelemetry};
use crate::status::SystemStatus;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};
use vfd_modbus::{ModbusTransport, SendOutcome, TransportError, TransportEvent};
use vfd_protocol::{
    CommandContext, CommandEncoder, DecodedResponse, ExceptionCode, HuanyangGeneration,
    LearnedLimits, ModbusFrame, ModbusRequest, RequestId, RunCommand, VendorProfile, decode_response, verify_ack,
};

/// VFD 主轴适配器
///
/// 通过 [`VfdSpindleBuilder`](crate::VfdSpindleBuilder) 创建。
pub struct VfdSpindle<T: ModbusTransport> {
    transport: T,
    encoder: CommandEncoder,
    learned: LearnedLimits,
    tracker: SpindleStateTracker,
    retry: RetryEscalation,
    outstanding: OutstandingRequests,
    mailbox: CommandMailbox,
    recovery: Option<RecoveryAction>,
    next_id: RequestId,
    ppr: u32,
    status: Arc<SystemStatus>,
    alarms: Arc<dyn AlarmSink>,
    rt_queue: RealtimeQueue,
}

impl<T: ModbusTransport> VfdSpindle<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        transport: T,
        encoder: CommandEncoder,
        tolerance: f32,
        max_retries: u16,
        ppr: u32,
        status: Arc<SystemStatus>,
        alarms: Arc<dyn AlarmSink>,
        rt_queue: RealtimeQueue,
    ) -> Self {
        Self {
            transport,
            encoder,
            learned: LearnedLimits::default(),
            tracker: SpindleStateTracker::new(tolerance),
            retry: RetryEscalation::new(max_retries),
            outstanding: OutstandingRequests::new(),
            mailbox: CommandMailbox::default(),
            recovery: None,
            next_id: RequestId(1),
            ppr,
            status,
            alarms,
            rt_queue,
        }
    }

    // ============================================================
    // 访问器
    // ============================================================

    pub fn profile(&self) -> &VendorProfile {
        self.encoder.profile()
    }

    pub fn learned_limits(&self) -> LearnedLimits {
        self.learned
    }

    pub fn retry(&self) -> &RetryEscalation {
        &self.retry
    }

    pub fn tracker(&self) -> &SpindleStateTracker {
        &self.tracker
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn status(&self) -> &Arc<SystemStatus> {
        &self.status
    }

    /// 冷启动期间延迟的报警所在队列
    pub fn realtime_queue(&self) -> &RealtimeQueue {
        &self.rt_queue
    }

    pub fn ppr(&self) -> u32 {
        self.ppr
    }

    /// 在途请求数
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// 邮箱中暂存的转速
    pub fn parked_rpm(&self) -> Option<f32> {
        self.mailbox.peek_rpm()
    }

    /// 邮箱中暂存的运行状态
    pub fn parked_state(&self) -> Option<ParkedState> {
        self.mailbox.peek_state()
    }

    pub fn is_transport_up(&self) -> bool {
        self.transport.is_up()
    }

    // ============================================================
    // 主轴操作
    // ============================================================

    /// 设置运行状态与目标转速
    ///
    /// 运行状态写入成功后才会继续写入转速。
    /// 已有命令在途时暂存，在后续 `poll` 中下发。
    pub fn set_state(&mut self, on: bool, clockwise: bool, rpm: f32) {
        self.apply_state(on, clockwise, rpm);
        self.run_recovery();
    }

    /// 运动中更新目标转速（非阻塞）
    pub fn update_rpm(&mut self, rpm: f32) {
        self.tracker.command_rpm(rpm);
        self.set_rpm(rpm, false);
        self.run_recovery();
    }

    /// 发起转速查询并立即返回上一次的状态
    ///
    /// 查询结果在后续 `poll` 中异步更新。
    /// 宿主装有编码器（`ppr > 0`）时，at-speed 按编码器转速重新判断。
    pub fn get_state(&mut self) -> SpindleState {
        self.request_state();
        self.run_recovery();

        if self.ppr > 0
            && let Some(rpm) = self.status.encoder_rpm()
        {
            self.tracker.apply_encoder_rpm(rpm);
        }

        self.tracker.state()
    }

    /// 缓存的状态（不发起查询）
    pub fn state(&self) -> SpindleState {
        self.tracker.state()
    }

    /// 遥测数据
    pub fn get_data(&self) -> SpindleTelemetry {
        self.tracker.telemetry()
    }

    /// 从驱动器学习转速上限（阻塞）
    ///
    /// 方言不需要学习上限时不发送任何请求，返回 `false`。
    pub fn query_max_rpm(&mut self) -> bool {
        let learned = self.request_max_rpm();
        self.run_recovery();
        learned
    }

    /// 宿主复位：学习到的上限不再有效，需要时重新查询
    pub fn reset(&mut self) {
        info!("VFD adapter reset ({})", self.profile().name());
        self.learned = LearnedLimits::default();
        self.outstanding.clear();
        self.mailbox.clear();
        self.recovery = None;
        if self.profile().requires_learned_max() {
            self.query_max_rpm();
        }
    }

    /// 分派传输层的异步事件，返回处理的事件数
    pub fn poll(&mut self) -> usize {
        let handled = self.drain_events();
        self.run_recovery();
        self.flush_mailbox();
        self.run_recovery();
        handled
    }

    // ============================================================
    // 内部实现
    // ============================================================

    fn apply_state(&mut self, on: bool, clockwise: bool, rpm: f32) {
        if self.outstanding.has_command() {
            self.drain_events();
        }
        if self.outstanding.has_command() {
            debug!("Command in flight, run state deferred");
            self.mailbox.park_state(ParkedState { on, clockwise, rpm });
            return;
        }
        // 本次写入即重新下发完整状态
        if self.recovery == Some(RecoveryAction::ReapplyState) {
            self.recovery = None;
        }

        if self.tracker.command(on, clockwise, rpm) {
            debug!("Spindle direction changed, speed will be reprogrammed");
        }

        let request = self
            .encoder
            .run_state(RunCommand::from_state(on, clockwise, rpm));
        if self.send(request, true) {
            self.set_rpm(rpm, true);
        }
    }

    fn request_state(&mut self) {
        let request = self.encoder.speed_query();
        self.send(request, false);
    }

    fn request_max_rpm(&mut self) -> bool {
        match self.encoder.max_speed_query() {
            Some(request) => self.send(request, true),
            None => false,
        }
    }

    fn set_rpm(&mut self, rpm: f32, block: bool) {
        // 新的目标转速取代邮箱中暂存的值
        if let Some(parked) = self.mailbox.take_rpm() {
            trace!("Parked speed {} RPM superseded by {} RPM", parked, rpm);
        }

        if !self.tracker.needs_program(rpm) {
            trace!("Speed {} RPM already programmed", rpm);
            return;
        }

        if self.outstanding.has_command() {
            self.drain_events();
        }
        if self.outstanding.has_command() {
            debug!("Command in flight, speed {} RPM parked", rpm);
            self.mailbox.park_rpm(rpm);
            return;
        }

        if matches!(self.profile(), VendorProfile::Huanyang(HuanyangGeneration::V2))
            && self.learned.rpm_max.is_none()
        {
            debug!("Maximum RPM unknown, querying drive first");
            self.request_max_rpm();
        }

        let request = match self.encoder.set_speed(rpm, &self.learned) {
            Ok(request) => request,
            Err(e) => {
                warn!("Skipping speed command {} RPM: {}", rpm, e);
                return;
            },
        };

        self.tracker.program_target(rpm);
        self.send(request, block);
    }

    fn flush_mailbox(&mut self) {
        if self.outstanding.has_command() || self.mailbox.is_empty() {
            return;
        }
        // 运行状态的转速写入会清空转速槽，先取出两个槽位
        let state = self.mailbox.take_state();
        let rpm = self.mailbox.take_rpm();

        if let Some(state) = state {
            trace!("Flushing parked run state {:?}", state);
            self.apply_state(state.on, state.clockwise, state.rpm);
        }
        if let Some(rpm) = rpm {
            self.set_rpm(rpm, false);
        }
    }

    /// 执行待处理的恢复动作，直到没有新的恢复动作
    ///
    /// 每轮要么成功（计数清零），要么再次故障（计数加一），
    /// 计数达到上限时报警且不再产生恢复动作，因此循环有界。
    fn run_recovery(&mut self) {
        while let Some(action) = self.recovery.take() {
            match action {
                RecoveryAction::ReapplyState => {
                    let state = self.tracker.state();
                    let rpm = self.tracker.rpm_commanded();
                    self.apply_state(state.on, state.clockwise, rpm);
                },
                RecoveryAction::RequeryState => self.request_state(),
                RecoveryAction::None => {},
            }
        }
    }

    /// 分派传输层已到达的事件，不补发邮箱内容
    fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.transport.poll() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// 发送请求；阻塞发送返回交换是否成功，非阻塞发送总是返回 `true`
    fn send(&mut self, request: ModbusRequest, block: bool) -> bool {
        let id = self.next_id;
        self.next_id = id.next();

        trace!(
            "tx {} {:?} [{}] block={}",
            id, request.context, request.frame, block
        );
        self.outstanding.insert(id, request);
        self.retry.on_request_issued();

        match self.transport.send(id, request, block) {
            SendOutcome::Completed(event) => self.dispatch(event),
            SendOutcome::Pending(_) => true,
        }
    }

    fn dispatch(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Response { id, context, frame } => {
                let Some(request) = self.outstanding.take(id) else {
                    debug!("Ignoring response {} ({:?}) with unknown id", id, context);
                    return false;
                };
                self.on_response(&request, &frame)
            },
            TransportEvent::Fault { id, context, error } => {
                let context = match id {
                    Some(id) => match self.outstanding.take(id) {
                        Some(request) => Some(request.context),
                        None => {
                            debug!("Ignoring fault {} with unknown id: {}", id, error);
                            return false;
                        },
                    },
                    None => context,
                };
                self.on_fault(context, DriverError::from(error));
                false
            },
        }
    }

    fn on_response(&mut self, request: &ModbusRequest, frame: &ModbusFrame) -> bool {
        let context = request.context;
        trace!("rx {:?} [{}]", context, frame);

        if frame.is_exception() {
            let code = ExceptionCode::from(frame.adu[2]);
            warn!("{:?} rejected by drive: {:?}", context, code);
            self.on_fault(Some(context), TransportError::Exception(code).into());
            return false;
        }

        if let Err(e) = verify_ack(request, frame) {
            warn!("{:?} acknowledgement rejected: {}", context, e);
            self.on_fault(Some(context), e.into());
            return false;
        }

        let decoded = match decode_response(self.profile(), context, frame, &self.learned) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Malformed {:?} response: {}", context, e);
                self.on_fault(Some(context), e.into());
                return false;
            },
        };

        match decoded {
            DecodedResponse::Speed { raw, rpm } => {
                trace!("Spindle speed raw={} rpm={}", raw, rpm);
                self.tracker.apply_rpm(rpm);
            },
            DecodedResponse::MaxRpm(max) => {
                if max == 0 {
                    warn!("Drive reported a maximum RPM of 0, ignoring");
                } else {
                    info!("Learned maximum RPM: {}", max);
                    self.learned.rpm_max = Some(max);
                }
            },
            DecodedResponse::MaxRpm50(max50) => {
                if max50 == 0 {
                    warn!("Drive reported 0 RPM at 50Hz, ignoring");
                } else {
                    info!("Learned RPM at 50Hz: {}", max50);
                    self.learned.rpm_max50 = max50;
                }
            },
            DecodedResponse::Acknowledged => {},
            DecodedResponse::Exception(code) => {
                self.on_fault(Some(context), TransportError::Exception(code).into());
                return false;
            },
        }

        self.retry.on_success();
        true
    }

    /// 处理故障；需要重试时只记录恢复动作，由 [`Self::run_recovery`] 执行
    fn on_fault(&mut self, context: Option<CommandContext>, error: DriverError) {
        if context == Some(CommandContext::SetSpeed) {
            self.tracker.invalidate_programmed();
        }

        match self.retry.on_fault(context, self.status.is_cold_start()) {
            FaultDecision::DeferredAlarm => {
                warn!(
                    "VFD fault during cold start ({:?}): {}, alarm deferred",
                    context, error
                );
                self.rt_queue.enqueue(RtCommand::RaiseAlarm(Alarm::Spindle));
            },
            FaultDecision::Alarm => {
                error!("VFD communication failed ({:?}): {}", context, error);
                self.recovery = None;
                self.alarms.raise_alarm(Alarm::Spindle);
            },
            FaultDecision::Retry(action) => {
                warn!(
                    "VFD fault ({:?}): {}, retry {}/{}",
                    context,
                    error,
                    self.retry.counter(),
                    self.retry.max_retries()
                );
                self.transport.reset();
                self.outstanding.clear();

                // ReapplyState 优先于 RequeryState
                self.recovery = match (self.recovery, action) {
                    (_, RecoveryAction::None) => self.recovery,
                    (Some(RecoveryAction::ReapplyState), _) => Some(RecoveryAction::ReapplyState),
                    (_, action) => Some(action),
                };
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VfdSpindleBuilder;
    use crate::alarm::AlarmLog;
    use crate::retry::RetryPhase;
    use vfd_modbus::{MockReply, MockTransport};
    use vfd_protocol::{GenericProfile, Yl620Profile};

    fn generic_spindle(
        max_retries: u16,
        tolerance: f32,
    ) -> (VfdSpindle<MockTransport>, Arc<AlarmLog>) {
        let alarms = Arc::new(AlarmLog::new());
        let spindle = VfdSpindleBuilder::new(VendorProfile::Generic(GenericProfile::default()))
            .max_retries(max_retries)
            .at_speed_tolerance(tolerance)
            .alarm_sink(alarms.clone())
            .build(MockTransport::new())
            .unwrap();
        (spindle, alarms)
    }

    #[test]
    fn test_set_state_writes_run_then_speed() {
        let (mut spindle, alarms) = generic_spindle(3, 0.0);
        spindle.set_state(true, true, 1000.0);

        let frames = spindle.transport().sent_frames();
        assert_eq!(
            frames,
            vec![
                vec![0x01, 0x06, 0x20, 0x00, 0x00, 0x01],
                vec![0x01, 0x06, 0x20, 0x01, 0x03, 0xE8],
            ]
        );
        assert_eq!(alarms.count(), 0);
        assert_eq!(spindle.outstanding(), 0);
        assert_eq!(spindle.tracker().rpm_programmed(), Some(1000.0));
    }

    #[test]
    fn test_failed_run_write_skips_speed() {
        let (mut spindle, _alarms) = generic_spindle(1, 0.0);
        spindle.transport_mut().push_reply(MockReply::Timeout);
        spindle.set_state(true, true, 1000.0);

        let sent = spindle.transport().sent_with_context(CommandContext::SetSpeed);
        assert!(sent.is_empty());
    }

    #[test]
    fn test_duplicate_set_state_not_resent() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.set_state(true, true, 1000.0);
        spindle.set_state(true, true, 1000.0);

        let speed_writes = spindle.transport().sent_with_context(CommandContext::SetSpeed);
        assert_eq!(speed_writes.len(), 1);
        let run_writes = spindle
            .transport()
            .sent_with_context(CommandContext::SetRunState);
        assert_eq!(run_writes.len(), 2);
    }

    #[test]
    fn test_direction_change_reprograms() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.set_state(true, true, 1000.0);
        spindle.set_state(true, false, 1000.0);

        let speed_writes = spindle.transport().sent_with_context(CommandContext::SetSpeed);
        assert_eq!(speed_writes.len(), 2);
    }

    #[test]
    fn test_get_state_returns_previous() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle
            .transport_mut()
            .push_reply(MockReply::respond(&[0x01, 0x03, 0x02, 0x03, 0xE8]));

        let before = spindle.get_state();
        assert!(!before.at_speed);
        assert_eq!(spindle.get_data().rpm, 0.0);

        assert_eq!(spindle.poll(), 1);
        assert_eq!(spindle.get_data().rpm, 1000.0);
        assert!(spindle.state().at_speed);
    }

    #[test]
    fn test_unknown_response_id_ignored() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().inject(TransportEvent::Response {
            id: RequestId(999),
            context: CommandContext::GetSpeed,
            frame: ModbusFrame::new(&[0x01, 0x03, 0x02, 0x03, 0xE8]),
        });
        spindle.poll();
        assert_eq!(spindle.get_data().rpm, 0.0);
    }

    #[test]
    fn test_retry_reissues_until_bound() {
        let (mut spindle, alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().push_replies(MockReply::Timeout, 2);
        spindle.set_state(true, true, 1000.0);

        assert_eq!(alarms.count(), 0);
        assert_eq!(spindle.transport().reset_count(), 2);
        assert_eq!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetRunState)
                .len(),
            3
        );
        assert_eq!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetSpeed)
                .len(),
            1
        );
        assert_eq!(spindle.retry().counter(), 0);
    }

    #[test]
    fn test_retry_exhaustion_raises_one_alarm() {
        let (mut spindle, alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().push_replies(MockReply::Timeout, 3);
        spindle.set_state(true, true, 1000.0);

        assert_eq!(alarms.alarms(), vec![Alarm::Spindle]);
        assert_eq!(spindle.retry().counter(), 0);
        assert_eq!(spindle.retry().phase(), RetryPhase::Idle);
        assert!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetSpeed)
                .is_empty()
        );
    }

    #[test]
    fn test_failed_speed_write_is_resent_on_recovery() {
        let (mut spindle, alarms) = generic_spindle(5, 0.0);
        // 运行状态写入成功，转速写入超时
        spindle.transport_mut().push_reply(MockReply::Auto);
        spindle.transport_mut().push_reply(MockReply::Timeout);
        spindle.set_state(true, true, 1000.0);

        assert_eq!(alarms.count(), 0);
        let speed_writes = spindle.transport().sent_with_context(CommandContext::SetSpeed);
        assert_eq!(speed_writes.len(), 2);
        assert_eq!(spindle.tracker().rpm_programmed(), Some(1000.0));
    }

    #[test]
    fn test_ack_mismatch_is_fault() {
        let (mut spindle, alarms) = generic_spindle(1, 0.0);
        spindle
            .transport_mut()
            .push_reply(MockReply::respond(&[0x01, 0x06, 0x20, 0x00, 0x00, 0x02]));
        spindle.set_state(true, true, 1000.0);

        assert_eq!(alarms.count(), 1);
        assert!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetSpeed)
                .is_empty()
        );
    }

    #[test]
    fn test_cold_start_defers_alarm() {
        let alarms = Arc::new(AlarmLog::new());
        let status = Arc::new(SystemStatus::new());
        let mut spindle = VfdSpindleBuilder::new(VendorProfile::Yl620(Yl620Profile::default()))
            .system_status(status.clone())
            .alarm_sink(alarms.clone())
            .build(MockTransport::new())
            .unwrap();

        spindle.transport_mut().push_reply(MockReply::Timeout);
        spindle.set_state(true, true, 6000.0);

        assert_eq!(alarms.count(), 0, "alarm must not be raised synchronously");
        assert_eq!(spindle.realtime_queue().len(), 1);

        status.set_cold_start(false);
        assert_eq!(spindle.realtime_queue().execute_pending(alarms.as_ref()), 1);
        assert_eq!(alarms.count(), 1);
    }

    #[test]
    fn test_neutral_fault_alarms_immediately() {
        let (mut spindle, alarms) = generic_spindle(10, 0.0);
        spindle.transport_mut().inject(TransportEvent::Fault {
            id: None,
            context: None,
            error: TransportError::Crc,
        });
        spindle.poll();
        assert_eq!(alarms.count(), 1);
        assert_eq!(spindle.transport().reset_count(), 0);
    }

    #[test]
    fn test_telemetry_fault_requeries() {
        let (mut spindle, alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().push_reply(MockReply::Timeout);
        spindle.get_state();
        spindle.poll();

        assert_eq!(alarms.count(), 0);
        assert_eq!(
            spindle
                .transport()
                .sent_with_context(CommandContext::GetSpeed)
                .len(),
            2
        );
    }

    #[test]
    fn test_update_rpm_parks_while_command_outstanding() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.set_state(true, true, 1000.0);

        spindle.transport_mut().push_reply(MockReply::Silent);
        spindle.update_rpm(2000.0);
        assert_eq!(spindle.outstanding(), 1);

        spindle.update_rpm(3000.0);
        spindle.update_rpm(4000.0);
        assert_eq!(spindle.parked_rpm(), Some(4000.0));

        // 复位丢弃在途请求和邮箱
        spindle.reset();
        assert_eq!(spindle.parked_rpm(), None);
    }

    #[test]
    fn test_update_rpm_back_to_programmed_clears_mailbox() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().push_reply(MockReply::Silent);
        spindle.update_rpm(2000.0);
        spindle.update_rpm(3000.0);
        assert_eq!(spindle.parked_rpm(), Some(3000.0));

        spindle.update_rpm(2000.0);
        assert_eq!(spindle.parked_rpm(), None);
    }

    #[test]
    fn test_update_rpm_flushes_mailbox_after_response() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().push_reply(MockReply::Silent);
        spindle.update_rpm(2000.0);
        spindle.update_rpm(3000.0);
        assert_eq!(spindle.parked_rpm(), Some(3000.0));

        let first = spindle.transport().sent()[0];
        spindle.transport_mut().inject(TransportEvent::Response {
            id: first.id,
            context: CommandContext::SetSpeed,
            frame: first.request.frame,
        });
        spindle.poll();
        assert_eq!(spindle.parked_rpm(), None);
        let speed_writes = spindle.transport().sent_with_context(CommandContext::SetSpeed);
        assert_eq!(speed_writes.len(), 2);
        assert_eq!(speed_writes[1].request.frame.as_slice(), &[0x01, 0x06, 0x20, 0x01, 0x0B, 0xB8]);
        spindle.poll();
        assert_eq!(spindle.outstanding(), 0);
    }

    #[test]
    fn test_arrived_response_resolves_before_next_command() {
        let (mut spindle, _alarms) = generic_spindle(3, 0.0);
        spindle.update_rpm(2000.0);
        // 第一条应答已在传输层排队，发新命令前先分派
        spindle.update_rpm(3000.0);

        assert_eq!(spindle.parked_rpm(), None);
        assert_eq!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetSpeed)
                .len(),
            2
        );
    }

    #[test]
    fn test_set_state_waits_for_outstanding_command() {
        let (mut spindle, alarms) = generic_spindle(3, 0.0);
        spindle.transport_mut().push_reply(MockReply::Silent);
        spindle.update_rpm(2000.0);
        assert_eq!(spindle.outstanding(), 1);

        spindle.set_state(true, false, 3000.0);
        assert!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetRunState)
                .is_empty()
        );
        assert_eq!(
            spindle.parked_state(),
            Some(ParkedState {
                on: true,
                clockwise: false,
                rpm: 3000.0,
            })
        );
        // 暂存运行状态之后的转速更新
        spindle.update_rpm(3500.0);
        assert_eq!(spindle.parked_rpm(), Some(3500.0));

        // 在途转速写入完成后补发运行状态和转速
        let first = spindle.transport().sent()[0];
        spindle.transport_mut().inject(TransportEvent::Response {
            id: first.id,
            context: CommandContext::SetSpeed,
            frame: first.request.frame,
        });
        spindle.poll();

        let sent = spindle.transport().sent_frames();
        assert_eq!(
            &sent[1..],
            &[
                vec![0x01, 0x06, 0x20, 0x00, 0x00, 0x02],
                vec![0x01, 0x06, 0x20, 0x01, 0x0B, 0xB8],
                vec![0x01, 0x06, 0x20, 0x01, 0x0D, 0xAC],
            ]
        );
        assert_eq!(spindle.parked_state(), None);
        assert_eq!(spindle.parked_rpm(), None);
        assert!(!spindle.state().clockwise);
        assert_eq!(alarms.count(), 0);
    }

    #[test]
    fn test_deep_retry_uses_constant_stack() {
        const MAX: u16 = 20_000;

        // 小栈线程：恢复若按重试次数递归会在此溢出
        let handle = std::thread::Builder::new()
            .stack_size(512 * 1024)
            .spawn(|| {
                let (mut spindle, alarms) = generic_spindle(MAX, 0.0);
                spindle
                    .transport_mut()
                    .push_replies(MockReply::Timeout, MAX as usize + 1);
                spindle.set_state(true, true, 1000.0);

                let run_writes = spindle
                    .transport()
                    .sent_with_context(CommandContext::SetRunState)
                    .len();
                (run_writes, alarms.count(), spindle.retry().counter())
            })
            .unwrap();

        let (run_writes, alarm_count, counter) = handle.join().unwrap();
        assert_eq!(run_writes, MAX as usize);
        assert_eq!(alarm_count, 1);
        assert_eq!(counter, 0);
    }

    #[test]
    fn test_exception_response_escalates() {
        let (mut spindle, alarms) = generic_spindle(2, 0.0);
        // 0x06 | 0x80，非法数据值
        spindle
            .transport_mut()
            .push_reply(MockReply::respond(&[0x01, 0x86, 0x03]));
        spindle.set_state(true, true, 1000.0);

        // 第一次被拒绝后重试成功
        assert_eq!(alarms.count(), 0);
        assert_eq!(spindle.transport().reset_count(), 1);
        assert_eq!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetRunState)
                .len(),
            2
        );
        assert_eq!(spindle.tracker().rpm_programmed(), Some(1000.0));

        // 持续被拒绝时达到上限报警
        let (mut spindle, alarms) = generic_spindle(2, 0.0);
        spindle
            .transport_mut()
            .push_replies(MockReply::respond(&[0x01, 0x86, 0x03]), 2);
        spindle.set_state(true, true, 1000.0);
        assert_eq!(alarms.alarms(), vec![Alarm::Spindle]);
        assert!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetSpeed)
                .is_empty()
        );
    }

    #[test]
    fn test_encoder_overrides_at_speed() {
        let status = Arc::new(SystemStatus::running());
        let mut spindle = VfdSpindleBuilder::new(VendorProfile::Generic(GenericProfile::default()))
            .at_speed_tolerance(0.1)
            .ppr(120)
            .system_status(status.clone())
            .build(MockTransport::new())
            .unwrap();

        spindle.set_state(true, true, 1000.0);
        assert!(!spindle.state().at_speed);

        status.set_encoder_rpm(Some(1010.0));
        assert!(spindle.get_state().at_speed);
    }

    #[test]
    fn test_huanyang_v2_learns_max_before_speed() {
        let mut spindle = VfdSpindleBuilder::new(VendorProfile::Huanyang(HuanyangGeneration::V2))
            .build(MockTransport::new())
            .unwrap();
        spindle.transport_mut().push_reply(MockReply::Auto); // run state
        spindle
            .transport_mut()
            .push_reply(MockReply::respond(&[0x01, 0x03, 0x04, 0x00, 0x5D, 0xC0, 0x00]));
        spindle.set_state(true, true, 12000.0);

        assert_eq!(spindle.learned_limits().rpm_max, Some(24000));
        let frames = spindle.transport().sent_frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1], vec![0x01, 0x03, 0xB0, 0x05, 0x00, 0x02]);
        assert_eq!(frames[2], vec![0x01, 0x06, 0x10, 0x00, 0x13, 0x88]);
    }

    #[test]
    fn test_huanyang_v2_unknown_max_skips_speed() {
        let mut spindle = VfdSpindleBuilder::new(VendorProfile::Huanyang(HuanyangGeneration::V2))
            .build(MockTransport::new())
            .unwrap();
        // 最大转速查询返回 0
        spindle.transport_mut().push_reply(MockReply::Auto);
        spindle
            .transport_mut()
            .push_reply(MockReply::respond(&[0x01, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00]));
        spindle.set_state(true, true, 12000.0);

        assert!(
            spindle
                .transport()
                .sent_with_context(CommandContext::SetSpeed)
                .is_empty()
        );
        assert_eq!(spindle.tracker().rpm_programmed(), None);
    }

    #[test]
    fn test_reset_requeries_learned_max() {
        let mut spindle = VfdSpindleBuilder::new(VendorProfile::Huanyang(HuanyangGeneration::V1))
            .build(MockTransport::new())
            .unwrap();
        spindle
            .transport_mut()
            .push_reply(MockReply::respond(&[0x01, 0x01, 0x03, 0x90, 0x0F, 0xA0]));
        assert!(spindle.query_max_rpm());
        assert_eq!(spindle.learned_limits().rpm_max50, 4000);

        spindle.reset();
        // 默认应答为回显：[01 01 03 90 00 00] => 0，忽略并保留默认值
        assert_eq!(spindle.learned_limits().rpm_max50, 3000);
        assert_eq!(
            spindle
                .transport()
                .sent_with_context(CommandContext::GetMaxSpeedAlt)
                .len(),
            2
        );
    }
}
