//! 结构比较模块
//!
//! 逐层递归配对左右两侧的声明树，并在每个节点上按目录顺序调用所有规则。
//!
//! 每一层按 `stable_id` 划分子节点：两侧都有的是已匹配对，只在左侧的一定会交给规则的
//! `on_left_only`，只在右侧的仅在严格模式下交给 `on_right_only`。递归只进入已匹配对的子节点。
//! 输出顺序 = 左侧声明顺序（匹配或仅左侧），其后是右侧独有的声明；同一节点内按规则目录顺序。
//! 之后不做任何排序，相同输入的重复运行产生完全相同的有序输出。

use crate::difference::CompatDifference;
use crate::model::{DeclarationNode, Side, SymbolForest};
use crate::rules::{RuleCatalog, RuleContext};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// 结构比较器
#[derive(Debug, Clone)]
pub struct ApiComparer {
    catalog: Arc<RuleCatalog>,
}

impl ApiComparer {
    pub fn new(catalog: Arc<RuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// 比较两侧的符号森林，返回有序的差异记录
    pub fn get_differences(&self, left: &SymbolForest, right: &SymbolForest) -> Vec<CompatDifference> {
        if left.side != Side::Left || right.side != Side::Right {
            warn!(
                "Comparing forests with unexpected sides: left={}, right={}",
                left.side, right.side
            );
        }

        let mut differences = Vec::new();
        let mut ancestry = Vec::new();
        self.compare_level(&left.namespaces, &right.namespaces, &mut ancestry, &mut differences);

        debug!(
            "Compared {} left nodes against {} right nodes: {} differences",
            left.node_count(),
            right.node_count(),
            differences.len()
        );
        differences
    }

    /// 比较同一层级的兄弟节点
    fn compare_level(
        &self,
        left: &[DeclarationNode],
        right: &[DeclarationNode],
        ancestry: &mut Vec<String>,
        differences: &mut Vec<CompatDifference>,
    ) {
        let mut right_index: HashMap<&str, &DeclarationNode> = HashMap::with_capacity(right.len());
        for node in right {
            right_index.entry(node.stable_id.as_str()).or_insert(node);
        }

        let mut matched_ids: HashSet<&str> = HashSet::with_capacity(left.len());
        for left_node in left {
            match right_index.get(left_node.stable_id.as_str()) {
                Some(right_node) => {
                    matched_ids.insert(left_node.stable_id.as_str());
                    self.visit_matched(left_node, right_node, ancestry, differences);
                }
                None => self.visit_left_only(left_node, ancestry, differences),
            }
        }

        if self.catalog.settings().strict_mode {
            let mut reported: HashSet<&str> = HashSet::new();
            for right_node in right {
                let id = right_node.stable_id.as_str();
                if matched_ids.contains(id) || !reported.insert(id) {
                    continue;
                }
                self.visit_right_only(right_node, ancestry, differences);
            }
        }
    }

    fn visit_matched(
        &self,
        left: &DeclarationNode,
        right: &DeclarationNode,
        ancestry: &mut Vec<String>,
        differences: &mut Vec<CompatDifference>,
    ) {
        {
            let context = RuleContext {
                settings: self.catalog.settings(),
                ancestry: ancestry.as_slice(),
            };
            for rule in self.catalog.rules() {
                rule.on_matched(left, right, &context, differences);
            }
        }

        if left.children.is_empty() && right.children.is_empty() {
            return;
        }
        ancestry.push(left.stable_id.clone());
        self.compare_level(&left.children, &right.children, ancestry, differences);
        ancestry.pop();
    }

    fn visit_left_only(
        &self,
        left: &DeclarationNode,
        ancestry: &[String],
        differences: &mut Vec<CompatDifference>,
    ) {
        let context = RuleContext {
            settings: self.catalog.settings(),
            ancestry,
        };
        for rule in self.catalog.rules() {
            rule.on_left_only(left, &context, differences);
        }
    }

    fn visit_right_only(
        &self,
        right: &DeclarationNode,
        ancestry: &[String],
        differences: &mut Vec<CompatDifference>,
    ) {
        let context = RuleContext {
            settings: self.catalog.settings(),
            ancestry,
        };
        for rule in self.catalog.rules() {
            rule.on_right_only(right, &context, differences);
        }
    }
}
