//! 增强配置
//!
use bon::Builder;

/// 增强策略：三种构造方式产出相同的能力集合
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnhanceMode {
    /// 产出新的独立类型，基础类型保持不变
    #[default]
    Extend,
    /// 标记共享的基础类型本身，之后该类型的所有实例都以增强形态创建
    Modify,
    /// 仅增强给定的单个实例
    ModifyInstance,
}

/// 增强器配置
#[derive(Builder, Clone, Debug, Default)]
pub struct EnhancerConfig {
    /// `Enhancer::enhance` 采用的策略
    #[builder(default)]
    pub mode: EnhanceMode,
    /// 新实例的事件路径分隔符（如 `:`），为空表示不展开
    #[builder(into)]
    pub path_separator: Option<String>,
}
