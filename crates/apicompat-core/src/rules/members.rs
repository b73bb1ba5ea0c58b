//! 成员存在性规则

use super::{Rule, RuleContext};
use crate::difference::{CompatDifference, DiagnosticId, DifferenceType};
use crate::model::{DeclarationKind, DeclarationNode};

/// 左侧的类型和成员必须在右侧存在
///
/// 从不对已匹配的声明报告。返回值按其 `->类型` id 参与匹配，
/// 所以返回类型的变化表现为旧返回值声明被移除。
pub struct MembersMustExist;

impl MembersMustExist {
    fn report(node: &DeclarationNode, difference_type: DifferenceType, out: &mut Vec<CompatDifference>) {
        match node.kind {
            DeclarationKind::Namespace => {
                for child in node.children.iter().filter(|c| c.kind.is_type()) {
                    out.push(CompatDifference::new(
                        DiagnosticId::TypeMustExist,
                        difference_type,
                        child.stable_id.clone(),
                    ));
                }
            }
            DeclarationKind::Type(_) => out.push(CompatDifference::new(
                DiagnosticId::TypeMustExist,
                difference_type,
                node.stable_id.clone(),
            )),
            DeclarationKind::Field
            | DeclarationKind::Property
            | DeclarationKind::Method
            | DeclarationKind::Event
            | DeclarationKind::Constructor
            | DeclarationKind::ReturnValue => out.push(CompatDifference::new(
                DiagnosticId::MemberMustExist,
                difference_type,
                node.stable_id.clone(),
            )),
            // 参数和泛型参数的位置编码在所属成员的 id 中
            DeclarationKind::Parameter | DeclarationKind::GenericParameter => {}
        }
    }
}

impl Rule for MembersMustExist {
    fn name(&self) -> &'static str {
        "MembersMustExist"
    }

    fn on_left_only(
        &self,
        left: &DeclarationNode,
        _context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        Self::report(left, DifferenceType::Removed, differences);
    }

    fn on_right_only(
        &self,
        right: &DeclarationNode,
        _context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        Self::report(right, DifferenceType::Added, differences);
    }
}
