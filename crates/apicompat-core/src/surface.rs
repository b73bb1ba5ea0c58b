//! API 表面描述模块
//!
//! 程序集公开表面的可序列化描述（JSON），以及把描述降级为带稳定 id 的声明树的过程。
//! 只有对外可见（public、protected、protected internal）的声明会进入声明树。

use crate::model::ids::{self, MemberPrefix};
use crate::model::{
    Accessibility, AttributeData, DeclarationKind, DeclarationNode, Modifiers, TypeKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 一个程序集的公开表面
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceAssembly {
    pub name: String,
    /// 引用的程序集名称
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    #[serde(default)]
    pub namespaces: Vec<SurfaceNamespace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceNamespace {
    pub name: String,
    #[serde(default)]
    pub types: Vec<SurfaceType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceType {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(flatten)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<SurfaceGenericParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<SurfaceMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_types: Vec<SurfaceType>,
}

/// 成员种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Event,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceMember {
    pub kind: MemberKind,
    /// 构造函数可以省略名称
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(flatten)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_parameters: Vec<SurfaceGenericParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<SurfaceParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub return_attributes: Vec<AttributeData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceGenericParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeData>,
}

impl SurfaceAssembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: SurfaceNamespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn with_reference(mut self, assembly_name: impl Into<String>) -> Self {
        self.references.push(assembly_name.into());
        self
    }

    /// 降级为命名空间节点列表
    ///
    /// 同名命名空间不在这里合并，由 [`crate::model::SymbolForest::merge`] 负责。
    pub fn lower(&self) -> Vec<DeclarationNode> {
        let mut namespaces = Vec::with_capacity(self.namespaces.len());
        let mut hidden = 0usize;

        for namespace in &self.namespaces {
            let mut node = DeclarationNode::new(
                DeclarationKind::Namespace,
                ids::namespace_id(&namespace.name),
                namespace.name.clone(),
            );
            let mut types = Vec::with_capacity(namespace.types.len());
            for ty in &namespace.types {
                if ty.accessibility.is_externally_visible() {
                    types.push(ty.lower(&namespace.name, &mut hidden));
                } else {
                    hidden += 1;
                }
            }
            node.extend_children(types);
            namespaces.push(node);
        }

        if hidden > 0 {
            debug!("{}: skipped {} non-visible declarations", self.name, hidden);
        }
        namespaces
    }
}

impl SurfaceNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: SurfaceType) -> Self {
        self.types.push(ty);
        self
    }
}

/// 泛型参数节点
fn lower_generic_parameters(
    owner_id: &str,
    parameters: &[SurfaceGenericParameter],
) -> impl Iterator<Item = DeclarationNode> {
    parameters.iter().enumerate().map(move |(index, parameter)| {
        let mut node = DeclarationNode::new(
            DeclarationKind::GenericParameter,
            ids::generic_parameter_id(owner_id, index),
            parameter.name.clone(),
        );
        node.constraints = parameter.constraints.clone();
        node.attributes = parameter.attributes.clone();
        node
    })
}

impl SurfaceType {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_generic_parameter(mut self, parameter: SurfaceGenericParameter) -> Self {
        self.generic_parameters.push(parameter);
        self
    }

    pub fn with_member(mut self, member: SurfaceMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_nested_type(mut self, ty: SurfaceType) -> Self {
        self.nested_types.push(ty);
        self
    }

    /// `container` 为外层命名空间名或外层类型的元数据名
    fn lower(&self, container: &str, hidden: &mut usize) -> DeclarationNode {
        let qualified = ids::qualify(container, &self.name);
        let metadata_name = ids::type_metadata_name(&qualified, self.generic_parameters.len());
        let id = format!("T:{metadata_name}");

        let mut node = DeclarationNode::new(DeclarationKind::Type(self.kind), id, self.name.clone());
        node.accessibility = self.accessibility;
        node.modifiers = self.modifiers;
        node.attributes = self.attributes.clone();

        let mut children: Vec<DeclarationNode> =
            lower_generic_parameters(&node.stable_id, &self.generic_parameters).collect();
        for member in &self.members {
            if member.accessibility.is_externally_visible() {
                children.push(member.lower(&metadata_name));
            } else {
                *hidden += 1;
            }
        }
        for nested in &self.nested_types {
            if nested.accessibility.is_externally_visible() {
                children.push(nested.lower(&metadata_name, hidden));
            } else {
                *hidden += 1;
            }
        }
        node.extend_children(children);
        node
    }
}

impl SurfaceMember {
    pub fn new(kind: MemberKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            accessibility: Accessibility::Public,
            modifiers: Modifiers::default(),
            generic_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
            return_attributes: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(MemberKind::Method, name)
    }

    pub fn constructor() -> Self {
        Self::new(MemberKind::Constructor, ids::CONSTRUCTOR_NAME)
    }

    pub fn field(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(MemberKind::Field, name).returns(type_name)
    }

    pub fn property(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(MemberKind::Property, name).returns(type_name)
    }

    pub fn event(name: impl Into<String>, handler_type: impl Into<String>) -> Self {
        Self::new(MemberKind::Event, name).returns(handler_type)
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_parameter(mut self, parameter: SurfaceParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_generic_parameter(mut self, parameter: SurfaceGenericParameter) -> Self {
        self.generic_parameters.push(parameter);
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_return_attribute(mut self, attribute: AttributeData) -> Self {
        self.return_attributes.push(attribute);
        self
    }

    fn declaration_kind(&self) -> (DeclarationKind, MemberPrefix) {
        match self.kind {
            MemberKind::Field => (DeclarationKind::Field, MemberPrefix::Field),
            MemberKind::Property => (DeclarationKind::Property, MemberPrefix::Property),
            MemberKind::Method => (DeclarationKind::Method, MemberPrefix::Method),
            MemberKind::Event => (DeclarationKind::Event, MemberPrefix::Event),
            MemberKind::Constructor => (DeclarationKind::Constructor, MemberPrefix::Method),
        }
    }

    fn lower(&self, type_metadata_name: &str) -> DeclarationNode {
        let (kind, prefix) = self.declaration_kind();
        let name = match self.kind {
            MemberKind::Constructor => ids::CONSTRUCTOR_NAME,
            _ => self.name.as_str(),
        };
        let parameter_types: Vec<String> =
            self.parameters.iter().map(|p| p.type_name.clone()).collect();
        let generic_arity = match self.kind {
            MemberKind::Method => self.generic_parameters.len(),
            _ => 0,
        };
        let id = ids::member_id(prefix, type_metadata_name, name, generic_arity, &parameter_types);

        let mut node = DeclarationNode::new(kind, id, name);
        node.accessibility = self.accessibility;
        node.modifiers = self.modifiers;
        node.attributes = self.attributes.clone();

        let mut children: Vec<DeclarationNode> = if generic_arity > 0 {
            lower_generic_parameters(&node.stable_id, &self.generic_parameters).collect()
        } else {
            Vec::new()
        };
        for (index, parameter) in self.parameters.iter().enumerate() {
            let mut child = DeclarationNode::new(
                DeclarationKind::Parameter,
                ids::parameter_id(&node.stable_id, index),
                parameter.name.clone(),
            );
            child.attributes = parameter.attributes.clone();
            children.push(child);
        }

        if self.kind == MemberKind::Method
            && (self.return_type.is_some() || !self.return_attributes.is_empty())
        {
            let return_type = self.return_type.as_deref().unwrap_or("void");
            let mut child = DeclarationNode::new(
                DeclarationKind::ReturnValue,
                ids::return_value_id(&node.stable_id, return_type),
                return_type,
            );
            child.attributes = self.return_attributes.clone();
            children.push(child);
        }
        node.extend_children(children);
        node
    }
}

impl SurfaceParameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }
}

impl SurfaceGenericParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeData) -> Self {
        self.attributes.push(attribute);
        self
    }
}
