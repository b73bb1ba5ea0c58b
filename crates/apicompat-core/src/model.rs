//! 符号图模块
//!
//! 定义比较引擎消费的声明树：命名空间 → 类型 → 成员 → 参数/泛型参数/返回值，
//! 以及挂载在每个节点上的特性（attribute）数据。

pub mod ids;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// 比较的一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// 基线（较早的）版本
    Left,
    /// 候选（较新的）版本
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// 类型的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// 声明种类
///
/// 封闭的标签联合，规则通过模式匹配决定关心哪些种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Namespace,
    Type(TypeKind),
    Field,
    Property,
    Method,
    Event,
    Constructor,
    ReturnValue,
    Parameter,
    GenericParameter,
}

impl DeclarationKind {
    /// 是否为类型成员（字段、属性、方法、事件、构造函数）
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Field
                | DeclarationKind::Property
                | DeclarationKind::Method
                | DeclarationKind::Event
                | DeclarationKind::Constructor
        )
    }

    pub fn is_type(&self) -> bool {
        matches!(self, DeclarationKind::Type(_))
    }
}

/// 可访问性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[default]
    Public,
    Protected,
    ProtectedInternal,
    Internal,
    PrivateProtected,
    Private,
}

impl Accessibility {
    /// 是否属于程序集对外暴露的表面
    pub fn is_externally_visible(&self) -> bool {
        matches!(
            self,
            Accessibility::Public | Accessibility::Protected | Accessibility::ProtectedInternal
        )
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Accessibility::Public => "public",
            Accessibility::Protected => "protected",
            Accessibility::ProtectedInternal => "protected internal",
            Accessibility::Internal => "internal",
            Accessibility::PrivateProtected => "private protected",
            Accessibility::Private => "private",
        };
        f.write_str(text)
    }
}

/// 声明修饰符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_sealed: bool,
    pub is_abstract: bool,
}

/// 特性参数值
///
/// 相等性为声明值类型上的值相等。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    String(String),
    /// typeof(...) 参数，值为类型 id
    Type(String),
    Enum {
        #[serde(rename = "type")]
        type_id: String,
        value: i64,
    },
    Array(Vec<AttributeValue>),
}

/// 浮点值按数值比较，NaN 与自身相等
impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttributeValue::Null, AttributeValue::Null) => true,
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a == b,
            (AttributeValue::Int(a), AttributeValue::Int(b)) => a == b,
            (AttributeValue::Uint(a), AttributeValue::Uint(b)) => a == b,
            (AttributeValue::Float(a), AttributeValue::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            (AttributeValue::Char(a), AttributeValue::Char(b)) => a == b,
            (AttributeValue::String(a), AttributeValue::String(b)) => a == b,
            (AttributeValue::Type(a), AttributeValue::Type(b)) => a == b,
            (
                AttributeValue::Enum { type_id, value },
                AttributeValue::Enum {
                    type_id: other_type,
                    value: other_value,
                },
            ) => type_id == other_type && value == other_value,
            (AttributeValue::Array(a), AttributeValue::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// 挂载在声明上的一个特性实例
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeData {
    /// 特性类型的完全限定 id，例如 `T:System.SerializableAttribute`
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<AttributeValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_arguments: BTreeMap<String, AttributeValue>,
}

impl AttributeData {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            arguments: Vec::new(),
            named_arguments: BTreeMap::new(),
        }
    }

    /// 追加一个构造函数参数
    pub fn with_argument(mut self, value: impl Into<AttributeValue>) -> Self {
        self.arguments.push(value.into());
        self
    }

    /// 设置一个命名参数
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.named_arguments.insert(name.into(), value.into());
        self
    }
}

/// 声明节点
///
/// `stable_id` 在同一侧同一层级的兄弟节点之间唯一，既是配对键，
/// 也是诊断信息中的成员引用。`children` 的顺序即声明顺序，只用于稳定输出，
/// 不参与匹配。
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    pub kind: DeclarationKind,
    pub stable_id: String,
    pub name: String,
    pub accessibility: Accessibility,
    pub modifiers: Modifiers,
    /// 泛型参数的约束，其它种类为空
    pub constraints: Vec<String>,
    pub attributes: Vec<AttributeData>,
    pub children: Vec<DeclarationNode>,
}

impl DeclarationNode {
    pub fn new(kind: DeclarationKind, stable_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            stable_id: stable_id.into(),
            name: name.into(),
            accessibility: Accessibility::Public,
            modifiers: Modifiers::default(),
            constraints: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 追加子节点，兄弟节点中已存在相同 id 时返回 false 并丢弃该节点
    pub fn push_child(&mut self, child: DeclarationNode) -> bool {
        push_unique(&mut self.children, child)
    }

    /// 批量追加子节点，只建立一次已有 id 的索引，返回实际追加的数量
    pub fn extend_children<I: IntoIterator<Item = DeclarationNode>>(&mut self, children: I) -> usize {
        extend_unique(&mut self.children, children)
    }

    /// 深度优先统计节点数量（含自身）
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DeclarationNode::node_count).sum::<usize>()
    }
}

/// 在保持 id 唯一的前提下追加节点
pub(crate) fn push_unique(siblings: &mut Vec<DeclarationNode>, node: DeclarationNode) -> bool {
    if siblings.iter().any(|s| s.stable_id == node.stable_id) {
        tracing::warn!("Dropping duplicate declaration {}", node.stable_id);
        return false;
    }
    siblings.push(node);
    true
}

/// 批量版本的 [`push_unique`]
pub(crate) fn extend_unique<I>(siblings: &mut Vec<DeclarationNode>, nodes: I) -> usize
where
    I: IntoIterator<Item = DeclarationNode>,
{
    let mut seen: HashSet<String> = siblings.iter().map(|s| s.stable_id.clone()).collect();
    let before = siblings.len();
    for node in nodes {
        if seen.insert(node.stable_id.clone()) {
            siblings.push(node);
        } else {
            tracing::warn!("Dropping duplicate declaration {}", node.stable_id);
        }
    }
    siblings.len() - before
}

/// 一侧的符号森林
///
/// 多个程序集的命名空间在这里合并成一个森林后再进行匹配。
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolForest {
    pub side: Side,
    pub namespaces: Vec<DeclarationNode>,
}

impl SymbolForest {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            namespaces: Vec::new(),
        }
    }

    pub fn with_namespaces(side: Side, namespaces: Vec<DeclarationNode>) -> Self {
        let mut forest = Self::new(side);
        forest.merge(namespaces);
        forest
    }

    /// 合并另一个程序集的命名空间
    ///
    /// 同 id 的命名空间合并子节点，重复的类型保留第一次出现的版本。
    pub fn merge(&mut self, namespaces: Vec<DeclarationNode>) {
        let mut index: HashMap<String, usize> = self
            .namespaces
            .iter()
            .enumerate()
            .map(|(i, ns)| (ns.stable_id.clone(), i))
            .collect();
        for namespace in namespaces {
            match index.get(&namespace.stable_id) {
                Some(&position) => {
                    self.namespaces[position].extend_children(namespace.children);
                }
                None => {
                    index.insert(namespace.stable_id.clone(), self.namespaces.len());
                    self.namespaces.push(namespace);
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.namespaces.iter().map(DeclarationNode::node_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
