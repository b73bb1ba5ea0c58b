//! 规则目录模块
//!
//! 每条规则检查一对已匹配的声明，或只存在于一侧的声明，并输出差异记录。
//! 规则在一次运行中只构造一次，只持有只读配置，因此可以在并发执行的工作项之间共享。

pub mod attributes;
pub mod members;
pub mod modifiers;

pub use attributes::{AttributeExclusions, AttributesMustMatch};
pub use members::MembersMustExist;
pub use modifiers::ModifiersMustMatch;

use crate::difference::CompatDifference;
use crate::model::DeclarationNode;
use tracing::debug;

/// 规则的只读配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSettings {
    /// 严格模式下也报告只存在于右侧的（纯新增的）声明
    pub strict_mode: bool,
}

impl RuleSettings {
    pub fn new(strict_mode: bool) -> Self {
        Self { strict_mode }
    }
}

/// 规则回调的上下文
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub settings: &'a RuleSettings,
    /// 从根到父节点的稳定 id 链
    pub ancestry: &'a [String],
}

impl<'a> RuleContext<'a> {
    pub fn parent_id(&self) -> Option<&'a str> {
        self.ancestry.last().map(String::as_str)
    }
}

/// 比较规则接口
///
/// 三个回调默认均为空操作，规则只需实现自己关心的部分，并在内部按
/// [`crate::model::DeclarationKind`] 模式匹配。
pub trait Rule: Send + Sync {
    /// 规则名称，用于日志
    fn name(&self) -> &'static str;

    /// 两侧都存在的声明
    fn on_matched(
        &self,
        _left: &DeclarationNode,
        _right: &DeclarationNode,
        _context: &RuleContext<'_>,
        _differences: &mut Vec<CompatDifference>,
    ) {
    }

    /// 只存在于左侧的声明
    fn on_left_only(
        &self,
        _left: &DeclarationNode,
        _context: &RuleContext<'_>,
        _differences: &mut Vec<CompatDifference>,
    ) {
    }

    /// 只存在于右侧的声明，仅在严格模式下由比较器调用
    fn on_right_only(
        &self,
        _right: &DeclarationNode,
        _context: &RuleContext<'_>,
        _differences: &mut Vec<CompatDifference>,
    ) {
    }
}

/// 有序规则目录
///
/// 目录顺序是确定性输出约定的一部分。
pub struct RuleCatalog {
    settings: RuleSettings,
    rules: Vec<Box<dyn Rule>>,
}

impl RuleCatalog {
    /// 构造默认目录：成员存在性、修饰符、特性
    pub fn new(settings: RuleSettings, exclusions: AttributeExclusions) -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(MembersMustExist),
            Box::new(ModifiersMustMatch),
            Box::new(AttributesMustMatch::new(exclusions)),
        ];
        Self::from_rules(settings, rules)
    }

    /// 使用自定义规则列表构造目录
    pub fn from_rules(settings: RuleSettings, rules: Vec<Box<dyn Rule>>) -> Self {
        debug!(
            "Rule catalog: [{}], strict_mode={}",
            rules.iter().map(|r| r.name()).collect::<Vec<_>>().join(", "),
            settings.strict_mode
        );
        Self { settings, rules }
    }

    pub fn settings(&self) -> &RuleSettings {
        &self.settings
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCatalog")
            .field("settings", &self.settings)
            .field(
                "rules",
                &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
