//! 脚本化的 Mock 传输（仅 `mock` feature）
//!
//! 记录所有发出的请求，并按脚本队列逐个应答。
//! 脚本耗尽后使用默认应答 [`MockReply::Auto`]：
//! 写命令回显请求，读保持寄存器返回全 0 数据。

use crate::{
    CommandContext, ExceptionCode, ModbusFrame, ModbusRequest, ModbusTransport, RequestId,
    SendOutcome, TransportError, TransportEvent,
};
use std::collections::VecDeque;
use tracing::trace;
use vfd_protocol::{EXCEPTION_FLAG, FunctionCode};

/// 脚本化应答
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// 写命令回显，读命令返回全 0
    Auto,
    /// 原样回显请求帧
    Echo,
    /// 返回指定响应帧
    Respond(ModbusFrame),
    /// 返回 Modbus 异常（以故障形式投递）
    Exception(ExceptionCode),
    /// 超时故障
    Timeout,
    /// 不应答（非阻塞请求保持未完成；阻塞请求按超时处理）
    Silent,
}

impl MockReply {
    /// 以字节构造响应
    pub fn respond(bytes: &[u8]) -> Self {
        Self::Respond(ModbusFrame::new(bytes))
    }
}

/// 发出的请求记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentRequest {
    pub id: RequestId,
    pub request: ModbusRequest,
    pub block: bool,
}

/// Mock 传输
#[derive(Debug)]
pub struct MockTransport {
    sent: Vec<SentRequest>,
    script: VecDeque<MockReply>,
    pending: VecDeque<TransportEvent>,
    resets: usize,
    up: bool,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            script: VecDeque::new(),
            pending: VecDeque::new(),
            resets: 0,
            up: true,
        }
    }

    /// 追加一个脚本应答
    pub fn push_reply(&mut self, reply: MockReply) {
        self.script.push_back(reply);
    }

    /// 追加多个相同的脚本应答
    pub fn push_replies(&mut self, reply: MockReply, count: usize) {
        for _ in 0..count {
            self.script.push_back(reply.clone());
        }
    }

    /// 直接注入一个事件（例如与任何请求无关的中性故障）
    pub fn inject(&mut self, event: TransportEvent) {
        self.pending.push_back(event);
    }

    /// 设置链路状态
    pub fn set_up(&mut self, up: bool) {
        self.up = up;
    }

    /// 已发送的请求
    pub fn sent(&self) -> &[SentRequest] {
        &self.sent
    }

    /// 已发送请求的帧字节
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .map(|s| s.request.frame.as_slice().to_vec())
            .collect()
    }

    /// 按上下文过滤已发送的请求
    pub fn sent_with_context(&self, context: CommandContext) -> Vec<SentRequest> {
        self.sent
            .iter()
            .filter(|s| s.request.context == context)
            .copied()
            .collect()
    }

    /// 取走已发送记录
    pub fn take_sent(&mut self) -> Vec<SentRequest> {
        std::mem::take(&mut self.sent)
    }

    /// 复位次数
    pub fn reset_count(&self) -> usize {
        self.resets
    }

    /// 尚未投递的事件数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn auto_reply(request: &ModbusRequest) -> ModbusFrame {
        let frame = &request.frame;
        if frame.function() == u8::from(FunctionCode::ReadHoldingRegisters) && frame.len == 6 {
            let count = frame.u16_at(4).unwrap_or(1).min(2) as usize;
            let mut bytes = [0u8; 7];
            bytes[0] = frame.address();
            bytes[1] = frame.function();
            bytes[2] = (count * 2) as u8;
            return ModbusFrame::new(&bytes[..3 + count * 2]);
        }
        *frame
    }

    fn reply_event(&mut self, id: RequestId, request: &ModbusRequest) -> Option<TransportEvent> {
        let reply = self.script.pop_front().unwrap_or(MockReply::Auto);
        let context = request.context;
        let fault = |error| TransportEvent::Fault {
            id: Some(id),
            context: Some(context),
            error,
        };

        match reply {
            MockReply::Auto => Some(TransportEvent::Response {
                id,
                context,
                frame: Self::auto_reply(request),
            }),
            MockReply::Echo => Some(TransportEvent::Response {
                id,
                context,
                frame: request.frame,
            }),
            MockReply::Respond(frame) => Some(TransportEvent::Response { id, context, frame }),
            MockReply::Exception(code) => Some(fault(TransportError::Exception(code))),
            MockReply::Timeout => Some(fault(TransportError::Timeout)),
            MockReply::Silent => None,
        }
    }
}

impl ModbusTransport for MockTransport {
    fn send(&mut self, id: RequestId, request: ModbusRequest, block: bool) -> SendOutcome {
        trace!("mock tx {} [{}] {:?}", id, request.frame, request.context);
        self.sent.push(SentRequest { id, request, block });

        if !self.up {
            let event = TransportEvent::Fault {
                id: Some(id),
                context: Some(request.context),
                error: TransportError::NotUp,
            };
            return if block {
                SendOutcome::Completed(event)
            } else {
                self.pending.push_back(event);
                SendOutcome::Pending(id)
            };
        }

        let event = self.reply_event(id, &request);
        if block {
            SendOutcome::Completed(event.unwrap_or(TransportEvent::Fault {
                id: Some(id),
                context: Some(request.context),
                error: TransportError::Timeout,
            }))
        } else {
            if let Some(event) = event {
                self.pending.push_back(event);
            }
            SendOutcome::Pending(id)
        }
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.pending.pop_front()
    }

    fn reset(&mut self) {
        trace!("mock transport reset");
        self.resets += 1;
        self.pending.clear();
    }

    fn is_up(&self) -> bool {
        self.up
    }
}

/// 构造异常响应帧（功能码最高位置 1）
pub fn exception_frame(address: u8, function: u8, code: ExceptionCode) -> ModbusFrame {
    ModbusFrame::new(&[address, function | EXCEPTION_FLAG, u8::from(code)])
}
