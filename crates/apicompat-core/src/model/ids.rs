//! 稳定标识符生成
//!
//! 采用文档注释 id 风格：
//!
//! - 命名空间 `N:Ns.Sub`
//! - 类型 `T:Ns.Outer.Inner`，泛型类型追加 `` `N``
//! - 成员 `F:`/`P:`/`E:`/`M:` + 类型名 + 成员名，方法的泛型元数追加 ``` ``N```，
//!   有参数时追加 `(T1,T2)`，构造函数名为 `#ctor`
//! - 参数 `{成员}${序号}`，泛型参数 `{所有者}<{序号}>`，返回值 `{成员}->{返回类型}`
//! - 特性引用 `{节点}:[{特性类型 id}]`

/// 成员 id 前缀
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberPrefix {
    Field,
    Property,
    Method,
    Event,
}

impl MemberPrefix {
    fn as_str(&self) -> &'static str {
        match self {
            MemberPrefix::Field => "F:",
            MemberPrefix::Property => "P:",
            MemberPrefix::Method => "M:",
            MemberPrefix::Event => "E:",
        }
    }
}

pub const CONSTRUCTOR_NAME: &str = "#ctor";

/// 拼接限定名，容器为空（全局命名空间）时直接返回名称
pub fn qualify(container: &str, name: &str) -> String {
    if container.is_empty() {
        name.to_string()
    } else {
        format!("{container}.{name}")
    }
}

pub fn namespace_id(name: &str) -> String {
    format!("N:{name}")
}

/// 类型的元数据名：泛型类型追加 `` `N``
pub fn type_metadata_name(qualified_name: &str, generic_arity: usize) -> String {
    if generic_arity == 0 {
        qualified_name.to_string()
    } else {
        format!("{qualified_name}`{generic_arity}")
    }
}

pub fn type_id(qualified_name: &str, generic_arity: usize) -> String {
    format!("T:{}", type_metadata_name(qualified_name, generic_arity))
}

/// 成员 id
///
/// `type_name` 为不带 `T:` 前缀的类型元数据名。
pub fn member_id(
    prefix: MemberPrefix,
    type_name: &str,
    member_name: &str,
    generic_arity: usize,
    parameter_types: &[String],
) -> String {
    let mut id = format!("{}{}.{}", prefix.as_str(), type_name, member_name);
    if generic_arity > 0 {
        id.push_str(&format!("``{generic_arity}"));
    }
    if !parameter_types.is_empty() {
        id.push('(');
        id.push_str(&parameter_types.join(","));
        id.push(')');
    }
    id
}

pub fn parameter_id(member_id: &str, index: usize) -> String {
    format!("{member_id}${index}")
}

pub fn generic_parameter_id(owner_id: &str, index: usize) -> String {
    format!("{owner_id}<{index}>")
}

pub fn return_value_id(member_id: &str, return_type: &str) -> String {
    format!("{member_id}->{return_type}")
}

/// 诊断中引用某个节点上特性的 id
pub fn attribute_reference(node_id: &str, attribute_type_id: &str) -> String {
    format!("{node_id}:[{attribute_type_id}]")
}
