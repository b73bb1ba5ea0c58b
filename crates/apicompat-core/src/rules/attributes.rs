//! 特性一致性规则
//!
//! 在每一个已匹配的声明节点上按特性类型 id 比较特性集合：
//! 左侧独有的类型报告 `Removed`，参数不同报告 `Changed`，右侧独有的类型报告 `Added`。
//! 排除列表中的特性类型完全跳过。

use super::{Rule, RuleContext};
use crate::difference::{CompatDifference, DiagnosticId, DifferenceType};
use crate::error::{ApiCompatError, Result};
use crate::model::{AttributeData, DeclarationNode, ids};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 被排除比较的特性类型 id 集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeExclusions {
    ids: HashSet<String>,
}

impl AttributeExclusions {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// 从一个或多个排除文件加载
    ///
    /// 每行一个特性类型 id，忽略空行和以 `#` 开头的行。
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut exclusions = Self::default();
        for path in paths {
            let path = path.as_ref();
            let content = fs::read_to_string(path).map_err(|e| {
                ApiCompatError::IoError(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to read attribute exclusion file {}: {}",
                        path.display(),
                        e
                    ),
                ))
            })?;
            let before = exclusions.ids.len();
            exclusions.extend_from_str(&content);
            debug!(
                "Loaded {} attribute exclusions from {}",
                exclusions.ids.len() - before,
                path.display()
            );
        }
        Ok(exclusions)
    }

    fn extend_from_str(&mut self, content: &str) {
        self.ids.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.ids.contains(type_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// 特性必须匹配
pub struct AttributesMustMatch {
    exclusions: AttributeExclusions,
}

impl AttributesMustMatch {
    pub fn new(exclusions: AttributeExclusions) -> Self {
        Self { exclusions }
    }
}

/// 按类型 id 分组，保持首次出现的顺序
fn group_by_type(attributes: &[AttributeData]) -> Vec<(&str, Vec<&AttributeData>)> {
    let mut groups: Vec<(&str, Vec<&AttributeData>)> = Vec::new();
    for attribute in attributes {
        match groups
            .iter_mut()
            .find(|(type_id, _)| *type_id == attribute.type_id)
        {
            Some((_, members)) => members.push(attribute),
            None => groups.push((attribute.type_id.as_str(), vec![attribute])),
        }
    }
    groups
}

/// 左侧每个特性实例都能在右侧找到一个互不重复的相等实例
fn group_matches(left: &[&AttributeData], right: &[&AttributeData]) -> bool {
    let mut used = vec![false; right.len()];
    for attribute in left {
        let candidate = right
            .iter()
            .enumerate()
            .position(|(i, other)| !used[i] && **other == **attribute);
        match candidate {
            Some(i) => used[i] = true,
            None => return false,
        }
    }
    true
}

impl Rule for AttributesMustMatch {
    fn name(&self) -> &'static str {
        "AttributesMustMatch"
    }

    fn on_matched(
        &self,
        left: &DeclarationNode,
        right: &DeclarationNode,
        _context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        if left.attributes.is_empty() && right.attributes.is_empty() {
            return;
        }

        let left_groups = group_by_type(&left.attributes);
        let right_groups = group_by_type(&right.attributes);
        let reference = |type_id: &str| ids::attribute_reference(&left.stable_id, type_id);

        for (type_id, left_attributes) in &left_groups {
            if self.exclusions.contains(type_id) {
                continue;
            }
            match right_groups.iter().find(|(other, _)| other == type_id) {
                None => differences.push(CompatDifference::new(
                    DiagnosticId::CannotRemoveAttribute,
                    DifferenceType::Removed,
                    reference(*type_id),
                )),
                Some((_, right_attributes)) => {
                    if !group_matches(left_attributes, right_attributes) {
                        differences.push(CompatDifference::new(
                            DiagnosticId::CannotChangeAttribute,
                            DifferenceType::Changed,
                            reference(*type_id),
                        ));
                    }
                }
            }
        }

        for (type_id, _) in &right_groups {
            if self.exclusions.contains(type_id)
                || left_groups.iter().any(|(other, _)| other == type_id)
            {
                continue;
            }
            differences.push(CompatDifference::new(
                DiagnosticId::CannotAddAttribute,
                DifferenceType::Added,
                reference(*type_id),
            ));
        }
    }
}
