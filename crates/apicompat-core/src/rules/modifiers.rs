//! 可见性、修饰符与泛型约束规则

use super::{Rule, RuleContext};
use crate::difference::{CompatDifference, DiagnosticId, DifferenceType};
use crate::model::{DeclarationKind, DeclarationNode};
use std::collections::BTreeSet;

/// 已匹配声明的可见性、static/virtual/sealed 修饰符以及泛型约束必须一致
///
/// 每个不一致的方面各产生一条 `Changed` 记录。
pub struct ModifiersMustMatch;

impl Rule for ModifiersMustMatch {
    fn name(&self) -> &'static str {
        "ModifiersMustMatch"
    }

    fn on_matched(
        &self,
        left: &DeclarationNode,
        right: &DeclarationNode,
        _context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        let mut changed = |id: DiagnosticId| {
            differences.push(CompatDifference::new(
                id,
                DifferenceType::Changed,
                left.stable_id.clone(),
            ));
        };

        match left.kind {
            DeclarationKind::Type(_)
            | DeclarationKind::Field
            | DeclarationKind::Property
            | DeclarationKind::Method
            | DeclarationKind::Event
            | DeclarationKind::Constructor => {
                if left.accessibility != right.accessibility {
                    changed(DiagnosticId::CannotChangeVisibility);
                }
                if left.modifiers.is_static != right.modifiers.is_static {
                    changed(DiagnosticId::CannotChangeStaticModifier);
                }
                if left.modifiers.is_virtual != right.modifiers.is_virtual {
                    changed(DiagnosticId::CannotChangeVirtualModifier);
                }
                if left.modifiers.is_sealed != right.modifiers.is_sealed {
                    changed(DiagnosticId::CannotChangeSealedModifier);
                }
            }
            DeclarationKind::GenericParameter => {
                let left_constraints: BTreeSet<&str> =
                    left.constraints.iter().map(String::as_str).collect();
                let right_constraints: BTreeSet<&str> =
                    right.constraints.iter().map(String::as_str).collect();
                if left_constraints != right_constraints {
                    changed(DiagnosticId::CannotChangeGenericConstraint);
                }
            }
            DeclarationKind::Namespace
            | DeclarationKind::ReturnValue
            | DeclarationKind::Parameter => {}
        }
    }
}
