//! # Error 模块
//!
//! 定义 scene-transition 中使用的错误类型。

use thiserror::Error;

use crate::graph::NodeId;

/// 过渡创建错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// 入场场景不存在
    #[error("入场场景 {0} 不存在")]
    MissingIncomingScene(NodeId),

    /// 入场场景与离场场景相同
    #[error("入场场景与离场场景相同: {0}")]
    SameScene(NodeId),

    /// 当前正在进行另一个过渡
    #[error("过渡 {0} 仍在进行")]
    TransitionInProgress(NodeId),

    /// 未知的过渡名称
    #[error("未知的过渡效果 '{name}'")]
    UnknownTransition { name: String },
}

/// 合成器错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositorError {
    /// 目标尺寸为 0
    #[error("离屏目标尺寸为 0")]
    ZeroSizedTarget,

    /// 离屏目标数量超出上限
    #[error("离屏目标数量已达上限 {limit}")]
    BudgetExhausted { limit: usize },

    /// 目标不存在（已释放或从未分配）
    #[error("离屏目标不存在")]
    UnknownTarget,
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析或序列化失败
    #[error("配置解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// scene-transition 统一错误类型
#[derive(Error, Debug)]
pub enum StageError {
    /// 过渡错误
    #[error("过渡错误: {0}")]
    Transition(#[from] TransitionError),

    /// 合成器错误
    #[error("合成器错误: {0}")]
    Compositor(#[from] CompositorError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type StageResult<T> = Result<T, StageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransitionError::UnknownTransition {
            name: "wipe".to_string(),
        };
        assert_eq!(err.to_string(), "未知的过渡效果 'wipe'");

        let err: StageError = CompositorError::BudgetExhausted { limit: 2 }.into();
        assert_eq!(err.to_string(), "合成器错误: 离屏目标数量已达上限 2");
    }
}
