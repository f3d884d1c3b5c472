//! 请求上下文
//!
//! 每个发往变频器的请求都携带一个 [`CommandContext`] 标签和一个 [`RequestId`]，
//! 传输层原样带回，响应/故障回调据此关联到发起的命令。

/// 请求对应的逻辑命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandContext {
    /// 设置运行/停止/方向
    SetRunState,
    /// 设置目标转速
    SetSpeed,
    /// 查询当前转速
    GetSpeed,
    /// 查询最大转速（Huanyang v2，寄存器 0xB005）
    GetMaxSpeed,
    /// 查询 50Hz 对应转速（Huanyang v1，PD144）
    GetMaxSpeedAlt,
}

impl CommandContext {
    /// 是否为只读查询
    pub fn is_query(self) -> bool {
        matches!(
            self,
            Self::GetSpeed | Self::GetMaxSpeed | Self::GetMaxSpeedAlt
        )
    }

    /// 是否为遥测查询（允许与其他请求重叠）
    pub fn is_telemetry(self) -> bool {
        self == Self::GetSpeed
    }
}

/// 请求 ID（单调递增，适配器内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId(pub u32);

impl RequestId {
    /// 下一个 ID（回绕）
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
