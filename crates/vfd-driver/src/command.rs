//! 在途请求与转速邮箱
//!
//! - [`OutstandingRequests`]：按 [`RequestId`] 关联响应与原始请求
//! - [`CommandMailbox`]：已有命令在途时暂存后续的运行状态和转速更新，
//!   每个槽位新值覆盖旧值

use smallvec::SmallVec;
use tracing::warn;
use vfd_protocol::{ModbusRequest, RequestId};

/// 在途请求上限（超出时丢弃最旧的记录）
pub const MAX_OUTSTANDING: usize = 4;

/// 在途请求缓冲区
///
/// 正常情况下至多一条命令加一条遥测查询在途，栈上预留 4 个位置即可。
pub type RequestBuffer = SmallVec<[(RequestId, ModbusRequest); MAX_OUTSTANDING]>;

/// 在途请求表
#[derive(Debug, Default)]
pub struct OutstandingRequests {
    entries: RequestBuffer,
}

impl OutstandingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记请求
    pub fn insert(&mut self, id: RequestId, request: ModbusRequest) {
        if self.entries.len() >= MAX_OUTSTANDING {
            let (stale, req) = self.entries.remove(0);
            warn!(
                "Outstanding table full, dropping request {} ({:?}); its response will be ignored",
                stale, req.context
            );
        }
        self.entries.push((id, request));
    }

    /// 取出并移除请求
    pub fn take(&mut self, id: RequestId) -> Option<ModbusRequest> {
        let index = self.entries.iter().position(|(i, _)| *i == id)?;
        Some(self.entries.remove(index).1)
    }

    /// 是否有非遥测命令在途
    pub fn has_command(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, req)| !req.context.is_telemetry())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// 暂存的运行状态命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkedState {
    pub on: bool,
    pub clockwise: bool,
    pub rpm: f32,
}

/// 命令邮箱（Overwrite 策略）
///
/// 运行状态和转速各占一个槽位。暂存运行状态时清空转速槽，
/// 因为运行状态本身已携带目标转速。
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandMailbox {
    state: Option<ParkedState>,
    rpm: Option<f32>,
}

impl CommandMailbox {
    /// 暂存运行状态，返回被覆盖的旧值
    pub fn park_state(&mut self, state: ParkedState) -> Option<ParkedState> {
        self.rpm = None;
        self.state.replace(state)
    }

    /// 暂存转速，返回被覆盖的旧值
    pub fn park_rpm(&mut self, rpm: f32) -> Option<f32> {
        self.rpm.replace(rpm)
    }

    pub fn take_state(&mut self) -> Option<ParkedState> {
        self.state.take()
    }

    pub fn take_rpm(&mut self) -> Option<f32> {
        self.rpm.take()
    }

    pub fn peek_state(&self) -> Option<ParkedState> {
        self.state
    }

    pub fn peek_rpm(&self) -> Option<f32> {
        self.rpm
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.rpm.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfd_protocol::CommandContext;

    // 编译期断言：请求必须是 Copy，SmallVec 才能以内存拷贝方式搬移
    const _: () = {
        fn assert_copy<T: Copy>() {}
        fn check() {
            assert_copy::<ModbusRequest>();
        }
        let _ = check;
    };

    fn req(context: CommandContext) -> ModbusRequest {
        ModbusRequest::new(context, &[0x01, 0x03, 0x00, 0x00, 0x00, 0x01], 7)
    }

    #[test]
    fn test_take_by_id() {
        let mut table = OutstandingRequests::new();
        table.insert(RequestId(1), req(CommandContext::SetSpeed));
        table.insert(RequestId(2), req(CommandContext::GetSpeed));

        assert!(table.take(RequestId(9)).is_none());
        assert_eq!(
            table.take(RequestId(1)).map(|r| r.context),
            Some(CommandContext::SetSpeed)
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_has_command_ignores_telemetry() {
        let mut table = OutstandingRequests::new();
        table.insert(RequestId(1), req(CommandContext::GetSpeed));
        assert!(!table.has_command());
        table.insert(RequestId(2), req(CommandContext::SetSpeed));
        assert!(table.has_command());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut table = OutstandingRequests::new();
        for i in 0..(MAX_OUTSTANDING as u32 + 2) {
            table.insert(RequestId(i), req(CommandContext::GetSpeed));
        }
        assert_eq!(table.len(), MAX_OUTSTANDING);
        assert!(table.take(RequestId(0)).is_none());
        assert!(table.take(RequestId(MAX_OUTSTANDING as u32 + 1)).is_some());
    }

    #[test]
    fn test_mailbox_latest_wins() {
        let mut mailbox = CommandMailbox::default();
        assert_eq!(mailbox.park_rpm(1000.0), None);
        assert_eq!(mailbox.park_rpm(1500.0), Some(1000.0));
        assert_eq!(mailbox.peek_rpm(), Some(1500.0));
        assert_eq!(mailbox.take_rpm(), Some(1500.0));
        assert_eq!(mailbox.take_rpm(), None);
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_parked_state_clears_rpm() {
        let mut mailbox = CommandMailbox::default();
        mailbox.park_rpm(1000.0);
        let state = ParkedState {
            on: true,
            clockwise: false,
            rpm: 3000.0,
        };
        assert_eq!(mailbox.park_state(state), None);
        assert_eq!(mailbox.peek_rpm(), None);

        // 之后的转速更新仍可叠加在运行状态之上
        mailbox.park_rpm(3500.0);
        assert_eq!(mailbox.take_state(), Some(state));
        assert_eq!(mailbox.take_rpm(), Some(3500.0));

        mailbox.park_rpm(1.0);
        mailbox.clear();
        assert!(mailbox.is_empty());
    }
}
