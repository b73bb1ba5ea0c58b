//! apicompat-core - API 兼容性校验核心库
//!
//! 比较同一个库两个版本（左侧为基线，右侧为候选）的公开表面，
//! 输出带类型的差异记录，并维护一个持久化的抑制基线，
//! 使 CI 只在出现新的不兼容变更时失败。

pub mod comparer;
pub mod difference;
pub mod discovery;
pub mod error;
pub mod metadata;
pub mod model;
pub mod provider;
pub mod rules;
pub mod runner;
pub mod suppression;
pub mod surface;
pub mod validate;

// 重新导出主要的公共 API
pub use comparer::ApiComparer;
pub use difference::{
    COMPATIBILITY_PREFIX, CompatDifference, DiagnosticId, DifferenceType,
    is_compatibility_diagnostic,
};
pub use discovery::{discover_input_groups, discover_inputs};
pub use error::{ApiCompatError, Result};
pub use metadata::{MetadataDescriptor, StringTransformer};
pub use model::{
    Accessibility, AttributeData, AttributeValue, DeclarationKind, DeclarationNode, Modifiers,
    Side, SymbolForest, TypeKind,
};
pub use provider::{
    InMemoryProvider, LoadedAssembly, ResolutionDiagnostic, SurfaceFileProvider, SymbolProvider,
    resolve_forest,
};
pub use rules::{AttributeExclusions, Rule, RuleCatalog, RuleContext, RuleSettings};
pub use runner::{
    ApiCompatRunner, RunReport, RunnerOptions, WorkItem, WorkItemResult, plan_work_items,
    select_references,
};
pub use suppression::{Suppression, SuppressionEngine, SuppressionOptions, parse_no_warn};
pub use surface::{
    MemberKind, SurfaceAssembly, SurfaceGenericParameter, SurfaceMember, SurfaceNamespace,
    SurfaceParameter, SurfaceType,
};
pub use validate::{SideInputs, ValidationOptions, ValidationOutcome, validate};
