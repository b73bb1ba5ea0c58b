//! 差异记录模块
//!
//! 定义诊断 id 表以及比较器输出的差异记录

use serde::{Deserialize, Serialize};
use std::fmt;

/// 兼容性诊断家族的 id 前缀（大小写不敏感）
pub const COMPATIBILITY_PREFIX: &str = "CP";

/// 诊断 id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticId {
    TypeMustExist,
    MemberMustExist,
    CannotChangeSealedModifier,
    CannotChangeVirtualModifier,
    CannotChangeStaticModifier,
    CannotRemoveAttribute,
    CannotChangeAttribute,
    CannotAddAttribute,
    CannotChangeVisibility,
    CannotChangeGenericConstraint,
    UnresolvedReference,
}

impl DiagnosticId {
    pub const ALL: [DiagnosticId; 11] = [
        DiagnosticId::TypeMustExist,
        DiagnosticId::MemberMustExist,
        DiagnosticId::CannotChangeSealedModifier,
        DiagnosticId::CannotChangeVirtualModifier,
        DiagnosticId::CannotChangeStaticModifier,
        DiagnosticId::CannotRemoveAttribute,
        DiagnosticId::CannotChangeAttribute,
        DiagnosticId::CannotAddAttribute,
        DiagnosticId::CannotChangeVisibility,
        DiagnosticId::CannotChangeGenericConstraint,
        DiagnosticId::UnresolvedReference,
    ];

    /// 诊断代码，例如 `CP0014`
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticId::TypeMustExist => "CP0001",
            DiagnosticId::MemberMustExist => "CP0002",
            DiagnosticId::CannotChangeSealedModifier => "CP0009",
            DiagnosticId::CannotChangeVirtualModifier => "CP0010",
            DiagnosticId::CannotChangeStaticModifier => "CP0012",
            DiagnosticId::CannotRemoveAttribute => "CP0014",
            DiagnosticId::CannotChangeAttribute => "CP0015",
            DiagnosticId::CannotAddAttribute => "CP0016",
            DiagnosticId::CannotChangeVisibility => "CP0019",
            DiagnosticId::CannotChangeGenericConstraint => "CP0021",
            DiagnosticId::UnresolvedReference => "CP1002",
        }
    }

    /// 人类可读的简短描述
    pub fn title(&self) -> &'static str {
        match self {
            DiagnosticId::TypeMustExist => "Type must exist on both sides",
            DiagnosticId::MemberMustExist => "Member must exist on both sides",
            DiagnosticId::CannotChangeSealedModifier => "Sealed modifier cannot change",
            DiagnosticId::CannotChangeVirtualModifier => "Virtual modifier cannot change",
            DiagnosticId::CannotChangeStaticModifier => "Static modifier cannot change",
            DiagnosticId::CannotRemoveAttribute => "Attribute cannot be removed",
            DiagnosticId::CannotChangeAttribute => "Attribute arguments cannot change",
            DiagnosticId::CannotAddAttribute => "Attribute cannot be added",
            DiagnosticId::CannotChangeVisibility => "Visibility cannot change",
            DiagnosticId::CannotChangeGenericConstraint => "Generic constraints cannot change",
            DiagnosticId::UnresolvedReference => "Referenced assembly could not be resolved",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 判断诊断代码是否属于兼容性家族
pub fn is_compatibility_diagnostic(code: &str) -> bool {
    code.get(..COMPATIBILITY_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(COMPATIBILITY_PREFIX))
}

/// 差异类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifferenceType {
    Added,
    Removed,
    Changed,
}

impl fmt::Display for DifferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferenceType::Added => write!(f, "Added"),
            DifferenceType::Removed => write!(f, "Removed"),
            DifferenceType::Changed => write!(f, "Changed"),
        }
    }
}

/// 一条检测到的不兼容差异
///
/// 相等性按所有字段结构化比较。`left`/`right` 为差异所属的左右程序集标识，
/// 由运行器在工作项执行后填充。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompatDifference {
    pub diagnostic_id: DiagnosticId,
    pub difference_type: DifferenceType,
    pub member_id: String,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl CompatDifference {
    pub fn new(
        diagnostic_id: DiagnosticId,
        difference_type: DifferenceType,
        member_id: impl Into<String>,
    ) -> Self {
        Self {
            diagnostic_id,
            difference_type,
            member_id: member_id.into(),
            left: None,
            right: None,
        }
    }

    /// 设置左右两侧的上下文
    pub fn with_context(mut self, left: Option<String>, right: Option<String>) -> Self {
        self.left = left;
        self.right = right;
        self
    }
}

impl fmt::Display for CompatDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.diagnostic_id, self.difference_type, self.member_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_prefix_is_case_insensitive() {
        assert!(is_compatibility_diagnostic("CP0014"));
        assert!(is_compatibility_diagnostic("cp0014"));
        assert!(!is_compatibility_diagnostic("PKV0001"));
        assert!(!is_compatibility_diagnostic("C"));
    }

    #[test]
    fn test_codes_round_trip() {
        for id in DiagnosticId::ALL {
            assert_eq!(DiagnosticId::from_code(id.code()), Some(id));
        }
        assert_eq!(DiagnosticId::from_code("cp0016"), Some(DiagnosticId::CannotAddAttribute));
        assert_eq!(DiagnosticId::from_code("XX0001"), None);
    }

    #[test]
    fn test_display_line() {
        let diff = CompatDifference::new(
            DiagnosticId::CannotRemoveAttribute,
            DifferenceType::Removed,
            "T:A.B:[T:C]",
        );
        assert_eq!(diff.to_string(), "CP0014 Removed T:A.B:[T:C]");
    }
}
