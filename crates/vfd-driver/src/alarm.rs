//! 报警投递
//!
//! 主轴通信失败时需要向宿主控制器报告一个致命报警。
//! 通常立即通过 [`AlarmSink`] 投递；冷启动期间实时命令队列尚不可用，
//! 报警改为压入 [`RealtimeQueue`]，待宿主开始执行实时命令时再投递。

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use tracing::{debug, error};

/// 报警类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alarm {
    /// 主轴通信失败
    Spindle,
}

impl std::fmt::Display for Alarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alarm::Spindle => write!(f, "Spindle communication failure"),
        }
    }
}

/// 报警接收方（由宿主实现）
pub trait AlarmSink: Send + Sync {
    fn raise_alarm(&self, alarm: Alarm);
}

/// 实时命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtCommand {
    /// 投递报警
    RaiseAlarm(Alarm),
}

/// 实时命令队列
///
/// 多生产者，宿主在安全点调用 [`execute_pending`](Self::execute_pending) 消费。
/// 克隆得到的句柄共享同一队列。
#[derive(Debug, Clone)]
pub struct RealtimeQueue {
    tx: Sender<RtCommand>,
    rx: Receiver<RtCommand>,
}

impl Default for RealtimeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// 压入命令
    pub fn enqueue(&self, command: RtCommand) -> bool {
        debug!("Enqueue realtime command {:?}", command);
        self.tx.send(command).is_ok()
    }

    /// 待执行命令数
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// 执行所有待处理命令，返回执行数量
    pub fn execute_pending(&self, sink: &dyn AlarmSink) -> usize {
        let mut executed = 0;
        while let Ok(command) = self.rx.try_recv() {
            match command {
                RtCommand::RaiseAlarm(alarm) => {
                    error!("Deferred alarm: {}", alarm);
                    sink.raise_alarm(alarm);
                },
            }
            executed += 1;
        }
        executed
    }
}

/// 记录所有报警的接收方
///
/// 用于模拟会话和测试。
#[derive(Debug, Default)]
pub struct AlarmLog {
    raised: Mutex<Vec<Alarm>>,
}

impl AlarmLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已投递的报警
    pub fn alarms(&self) -> Vec<Alarm> {
        self.raised.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.raised.lock().len()
    }

    pub fn clear(&self) {
        self.raised.lock().clear();
    }
}

impl AlarmSink for AlarmLog {
    fn raise_alarm(&self, alarm: Alarm) {
        self.raised.lock().push(alarm);
    }
}
