//! 符号提供者模块
//!
//! 把程序集描述符解析为声明树。[`SurfaceFileProvider`] 读取 JSON 表面描述文件，
//! [`InMemoryProvider`] 持有预先构造的表面描述，便于嵌入和测试。

use crate::error::{ApiCompatError, Result};
use crate::metadata::MetadataDescriptor;
use crate::model::{DeclarationNode, Side, SymbolForest};
use crate::surface::SurfaceAssembly;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 一个已加载的程序集
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAssembly {
    pub name: String,
    pub namespaces: Vec<DeclarationNode>,
    /// 在描述符的引用集合中找不到的程序集名称
    pub unresolved: Vec<String>,
}

impl LoadedAssembly {
    /// 降级表面描述并检查引用
    pub fn from_surface(surface: &SurfaceAssembly, descriptor: &MetadataDescriptor) -> Self {
        Self {
            name: surface.name.clone(),
            namespaces: surface.lower(),
            unresolved: unresolved_references(surface, descriptor),
        }
    }
}

/// 引用名与引用路径的文件名（不含扩展名）按 ASCII 大小写不敏感比较
fn unresolved_references(surface: &SurfaceAssembly, descriptor: &MetadataDescriptor) -> Vec<String> {
    if !descriptor.has_references() {
        return Vec::new();
    }
    let available: Vec<String> = descriptor
        .references
        .iter()
        .filter_map(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().to_ascii_lowercase())
        .collect();

    surface
        .references
        .iter()
        .filter(|name| !available.contains(&name.to_ascii_lowercase()))
        .cloned()
        .collect()
}

/// 无法解析的引用
///
/// 不会终止运行，以 `CP1002` 诊断的形式与差异记录一同报告。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionDiagnostic {
    pub side: Side,
    /// 发起引用的程序集标识
    pub assembly: String,
    pub unresolved: String,
}

/// 符号提供者接口
pub trait SymbolProvider: Send + Sync {
    fn load(&self, descriptor: &MetadataDescriptor, side: Side) -> Result<LoadedAssembly>;
}

/// 读取 JSON 表面描述文件
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceFileProvider;

impl SurfaceFileProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn read_surface(path: &Path) -> Result<SurfaceAssembly> {
        let file = File::open(path).map_err(|e| {
            ApiCompatError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ApiCompatError::SymbolLoadError(format!("{}: {}", path.display(), e))
        })
    }
}

impl SymbolProvider for SurfaceFileProvider {
    fn load(&self, descriptor: &MetadataDescriptor, side: Side) -> Result<LoadedAssembly> {
        debug!("Loading {} surface from {}", side, descriptor.full_path.display());
        let surface = Self::read_surface(&descriptor.full_path)?;
        Ok(LoadedAssembly::from_surface(&surface, descriptor))
    }
}

/// 按路径索引的内存表面描述
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    surfaces: HashMap<PathBuf, SurfaceAssembly>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, surface: SurfaceAssembly) {
        self.surfaces.insert(path.into(), surface);
    }

    pub fn with_surface(mut self, path: impl Into<PathBuf>, surface: SurfaceAssembly) -> Self {
        self.insert(path, surface);
        self
    }
}

impl SymbolProvider for InMemoryProvider {
    fn load(&self, descriptor: &MetadataDescriptor, _side: Side) -> Result<LoadedAssembly> {
        let surface = self.surfaces.get(&descriptor.full_path).ok_or_else(|| {
            ApiCompatError::SymbolLoadError(format!(
                "No surface registered for {}",
                descriptor.full_path.display()
            ))
        })?;
        Ok(LoadedAssembly::from_surface(surface, descriptor))
    }
}

/// 把一侧的所有描述符加载并合并为一个符号森林
pub fn resolve_forest(
    provider: &dyn SymbolProvider,
    descriptors: &[MetadataDescriptor],
    side: Side,
) -> Result<(SymbolForest, Vec<ResolutionDiagnostic>)> {
    let mut forest = SymbolForest::new(side);
    let mut diagnostics = Vec::new();

    for descriptor in descriptors {
        let loaded = provider.load(descriptor, side)?;
        for unresolved in loaded.unresolved {
            warn!(
                "Could not resolve reference '{}' of {} assembly {}",
                unresolved, side, descriptor.id
            );
            diagnostics.push(ResolutionDiagnostic {
                side,
                assembly: descriptor.id.clone(),
                unresolved,
            });
        }
        forest.merge(loaded.namespaces);
    }

    debug!(
        "Resolved {} {} assemblies into {} declarations",
        descriptors.len(),
        side,
        forest.node_count()
    );
    Ok((forest, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{SurfaceNamespace, SurfaceType};
    use tempfile::TempDir;

    fn surface(name: &str, types: &[&str]) -> SurfaceAssembly {
        let mut namespace = SurfaceNamespace::new("Lib");
        for ty in types {
            namespace = namespace.with_type(SurfaceType::class(*ty));
        }
        SurfaceAssembly::new(name).with_namespace(namespace)
    }

    #[test]
    fn test_file_provider_reads_surface() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("Lib.json");
        let assembly = surface("Lib", &["Widget"]).with_reference("System.Runtime");
        std::fs::write(&path, serde_json::to_string(&assembly).expect("serialize")).expect("write");

        let descriptor = MetadataDescriptor::new(&path)
            .with_references([dir.path().join("system.runtime.json")]);
        let loaded = SurfaceFileProvider::new().load(&descriptor, Side::Left).expect("load");
        assert_eq!(loaded.name, "Lib");
        assert_eq!(loaded.namespaces[0].children[0].stable_id, "T:Lib.Widget");
        assert!(loaded.unresolved.is_empty());
    }

    #[test]
    fn test_unresolved_references_only_checked_with_reference_set() {
        let assembly = surface("Lib", &[]).with_reference("System.Runtime").with_reference("Other");

        let without = MetadataDescriptor::new("/v1/Lib.json");
        assert!(LoadedAssembly::from_surface(&assembly, &without).unresolved.is_empty());

        let with = without.with_references([PathBuf::from("/refs/System.Runtime.dll")]);
        assert_eq!(
            LoadedAssembly::from_surface(&assembly, &with).unresolved,
            vec!["Other".to_string()]
        );
    }

    #[test]
    fn test_malformed_surface_is_a_load_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("Broken.json");
        std::fs::write(&path, "[1, 2").expect("write");

        let result = SurfaceFileProvider::new().load(&MetadataDescriptor::new(&path), Side::Right);
        assert!(matches!(result, Err(ApiCompatError::SymbolLoadError(_))));
    }

    #[test]
    fn test_resolve_forest_merges_assemblies() {
        let provider = InMemoryProvider::new()
            .with_surface("/v1/A.json", surface("A", &["One", "Two"]).with_reference("Missing"))
            .with_surface("/v1/B.json", surface("B", &["Two", "Three"]));
        let descriptors = vec![
            MetadataDescriptor::new("/v1/A.json").with_references([PathBuf::from("/refs/B.json")]),
            MetadataDescriptor::new("/v1/B.json"),
        ];

        let (forest, diagnostics) = resolve_forest(&provider, &descriptors, Side::Left).expect("resolve");
        let ids: Vec<_> = forest.namespaces[0]
            .children
            .iter()
            .map(|c| c.stable_id.as_str())
            .collect();
        assert_eq!(ids, vec!["T:Lib.One", "T:Lib.Two", "T:Lib.Three"]);
        assert_eq!(
            diagnostics,
            vec![ResolutionDiagnostic {
                side: Side::Left,
                assembly: "/v1/A.json".to_string(),
                unresolved: "Missing".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_in_memory_surface() {
        let provider = InMemoryProvider::new();
        let result = provider.load(&MetadataDescriptor::new("/nowhere.json"), Side::Left);
        assert!(matches!(result, Err(ApiCompatError::SymbolLoadError(_))));
    }
}
