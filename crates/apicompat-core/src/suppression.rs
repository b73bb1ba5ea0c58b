//! 抑制引擎模块
//!
//! 维护一组已接受的差异（抑制项），判断新检测到的差异是否已被接受，
//! 在基线模式下自动接受所有差异，并把抑制集合持久化为稳定排序的 JSON 文件。
//!
//! 一个引擎实例在一次运行的所有工作项之间共享。集合只插入不删除，
//! 读操作之间互不阻塞；插入由 `insert_gate` 串行化，只在真正写入时才获取独占写锁。

use crate::difference::{CompatDifference, is_compatibility_diagnostic};
use crate::error::{ApiCompatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, info};

/// 一条抑制项
///
/// 相等性为所有字段的值相等。`target`/`left`/`right` 为空的抑制项在兼容性
/// 诊断上充当通配形式，见 [`SuppressionEngine::is_error_suppressed`]。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Suppression {
    #[serde(rename = "diagnosticKind")]
    pub diagnostic_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(rename = "isBaseline", default)]
    pub is_baseline_suppression: bool,
}

impl Suppression {
    pub fn new(diagnostic_id: impl Into<String>) -> Self {
        Self {
            diagnostic_id: diagnostic_id.into(),
            target: None,
            left: None,
            right: None,
            is_baseline_suppression: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_sides(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left = Some(left.into());
        self.right = Some(right.into());
        self
    }

    pub fn baseline(mut self, is_baseline_suppression: bool) -> Self {
        self.is_baseline_suppression = is_baseline_suppression;
        self
    }

    /// 忽略左右两侧、只保留诊断 id 与目标的通配形式
    fn target_wildcard(&self) -> Self {
        Self {
            diagnostic_id: self.diagnostic_id.clone(),
            target: self.target.clone(),
            left: None,
            right: None,
            is_baseline_suppression: self.is_baseline_suppression,
        }
    }

    /// 忽略目标、只保留诊断 id 与左右两侧的通配形式
    fn sides_wildcard(&self) -> Self {
        Self {
            diagnostic_id: self.diagnostic_id.clone(),
            target: None,
            left: self.left.clone(),
            right: self.right.clone(),
            is_baseline_suppression: self.is_baseline_suppression,
        }
    }
}

impl From<&CompatDifference> for Suppression {
    fn from(difference: &CompatDifference) -> Self {
        Self {
            diagnostic_id: difference.diagnostic_id.code().to_string(),
            target: Some(difference.member_id.clone()),
            left: difference.left.clone(),
            right: difference.right.clone(),
            is_baseline_suppression: false,
        }
    }
}

/// 抑制引擎的不可变配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionOptions {
    /// 无条件抑制的诊断 id
    pub no_warn: HashSet<String>,
    /// 基线模式：未被抑制的差异自动接受
    pub baseline_all_errors: bool,
}

impl SuppressionOptions {
    pub fn new(no_warn: HashSet<String>, baseline_all_errors: bool) -> Self {
        Self {
            no_warn,
            baseline_all_errors,
        }
    }
}

/// 解析 no-warn 列表，接受 `;` 或 `,` 分隔
pub fn parse_no_warn(value: &str) -> HashSet<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// 线程安全的抑制引擎
#[derive(Debug, Default)]
pub struct SuppressionEngine {
    suppressions: RwLock<HashSet<Suppression>>,
    insert_gate: Mutex<()>,
    options: SuppressionOptions,
}

impl SuppressionEngine {
    /// 使用空集合构造
    pub fn new(options: SuppressionOptions) -> Self {
        Self::with_suppressions(HashSet::new(), options)
    }

    pub fn with_suppressions(suppressions: HashSet<Suppression>, options: SuppressionOptions) -> Self {
        Self {
            suppressions: RwLock::new(suppressions),
            insert_gate: Mutex::new(()),
            options,
        }
    }

    /// 从抑制文件加载
    ///
    /// 未指定文件时从空集合开始。文件无法读取或解析时返回错误，
    /// 因为无法确定哪些差异已被接受。
    pub fn load(path: Option<&Path>, options: SuppressionOptions) -> Result<Self> {
        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(Self::new(options));
        };

        let file = File::open(path).map_err(|e| {
            ApiCompatError::SuppressionFileError(format!(
                "Failed to open suppression file {}: {}",
                path.display(),
                e
            ))
        })?;
        let records: Vec<Suppression> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                ApiCompatError::SuppressionFileError(format!(
                    "Failed to parse suppression file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        debug!(
            "Loaded {} suppressions from {}",
            records.len(),
            path.display()
        );
        Ok(Self::with_suppressions(records.into_iter().collect(), options))
    }

    pub fn options(&self) -> &SuppressionOptions {
        &self.options
    }

    pub fn baseline_all_errors(&self) -> bool {
        self.options.baseline_all_errors
    }

    /// 差异是否已被抑制
    pub fn is_suppressed(&self, difference: &CompatDifference) -> bool {
        self.is_error_suppressed(&Suppression::from(difference))
    }

    /// 查询一条抑制形式的错误是否已被抑制
    ///
    /// 依次检查：no-warn 集合；精确匹配；兼容性诊断上的两种通配形式
    /// （同 id 同目标、同 id 同左右两侧）。仍未命中且处于基线模式时，
    /// 接受该错误并返回 true。
    pub fn is_error_suppressed(&self, error: &Suppression) -> bool {
        if self.options.no_warn.contains(&error.diagnostic_id) {
            return true;
        }

        {
            let suppressions = self.suppressions.read().unwrap_or_else(PoisonError::into_inner);
            if suppressions.contains(error) {
                return true;
            }
            if is_compatibility_diagnostic(&error.diagnostic_id)
                && (suppressions.contains(&error.target_wildcard())
                    || suppressions.contains(&error.sides_wildcard()))
            {
                return true;
            }
        }

        if self.options.baseline_all_errors {
            self.add_suppression(error.clone());
            return true;
        }
        false
    }

    /// 接受一条差异
    pub fn accept(&self, difference: &CompatDifference) -> bool {
        self.add_suppression(Suppression::from(difference))
    }

    /// 插入抑制项，已存在时返回 false
    pub fn add_suppression(&self, suppression: Suppression) -> bool {
        let _gate = self.insert_gate.lock().unwrap_or_else(PoisonError::into_inner);

        let exists = self
            .suppressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&suppression);
        if exists {
            return false;
        }

        debug!(
            "Accepting {} {}",
            suppression.diagnostic_id,
            suppression.target.as_deref().unwrap_or("")
        );
        self.suppressions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(suppression)
    }

    /// 按排序顺序返回当前集合的快照
    pub fn suppressions(&self) -> Vec<Suppression> {
        let mut snapshot: Vec<Suppression> = self
            .suppressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        snapshot.sort();
        snapshot
    }

    pub fn len(&self) -> usize {
        self.suppressions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 将集合写入抑制文件
    ///
    /// 集合为空时不触碰目标文件并返回 `Ok(false)`。
    pub fn write_suppressions_to_file(&self, path: &Path) -> Result<bool> {
        let snapshot = self.suppressions();
        if snapshot.is_empty() {
            return Ok(false);
        }

        let io_error = |e: std::io::Error| {
            ApiCompatError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to write suppression file {}: {}", path.display(), e),
            ))
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &snapshot)
            .map_err(|e| ApiCompatError::SerializationError(e.to_string()))?;
        writer.write_all(b"\n").map_err(io_error)?;
        writer.flush().map_err(io_error)?;

        info!(
            "Wrote {} suppressions to {}",
            snapshot.len(),
            path.display()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difference::{DiagnosticId, DifferenceType};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn difference(member_id: &str, left: &str, right: &str) -> CompatDifference {
        CompatDifference::new(
            DiagnosticId::CannotRemoveAttribute,
            DifferenceType::Removed,
            member_id,
        )
        .with_context(Some(left.to_string()), Some(right.to_string()))
    }

    #[test]
    fn test_accept_then_suppressed() {
        let engine = SuppressionEngine::new(SuppressionOptions::default());
        let diff = difference("T:A.B:[T:C]", "left.json", "right.json");
        assert!(!engine.is_suppressed(&diff));
        assert!(engine.accept(&diff));
        assert!(!engine.accept(&diff));
        assert!(engine.is_suppressed(&diff));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_target_wildcard_ignores_sides() {
        let engine = SuppressionEngine::new(SuppressionOptions::default());
        engine.add_suppression(Suppression::new("CP0014").with_target("T:A.B:[T:C]"));

        assert!(engine.is_suppressed(&difference("T:A.B:[T:C]", "a", "b")));
        assert!(engine.is_suppressed(&difference("T:A.B:[T:C]", "x", "y")));
        assert!(!engine.is_suppressed(&difference("T:A.Other:[T:C]", "a", "b")));
    }

    #[test]
    fn test_sides_wildcard_ignores_target() {
        let engine = SuppressionEngine::new(SuppressionOptions::default());
        engine.add_suppression(Suppression::new("CP0014").with_sides("a", "b"));

        assert!(engine.is_suppressed(&difference("T:A.One:[T:C]", "a", "b")));
        assert!(engine.is_suppressed(&difference("T:A.Two:[T:C]", "a", "b")));
        assert!(!engine.is_suppressed(&difference("T:A.One:[T:C]", "a", "c")));
    }

    #[test]
    fn test_wildcards_only_apply_to_compatibility_family() {
        let engine = SuppressionEngine::new(SuppressionOptions::default());
        engine.add_suppression(Suppression::new("PKV0001").with_target("lib/net8.0/A.dll"));

        let exact = Suppression::new("PKV0001").with_target("lib/net8.0/A.dll");
        assert!(engine.is_error_suppressed(&exact));
        assert!(!engine.is_error_suppressed(&exact.clone().with_sides("a", "b")));

        engine.add_suppression(Suppression::new("cp0002").with_target("M:A.B.F"));
        assert!(engine.is_error_suppressed(&Suppression::new("cp0002").with_target("M:A.B.F").with_sides("a", "b")));
    }

    #[test]
    fn test_no_warn_short_circuits() {
        let options = SuppressionOptions::new(parse_no_warn("CP0014; CP0016"), false);
        let engine = SuppressionEngine::new(options);
        assert!(engine.is_suppressed(&difference("T:A.B:[T:C]", "a", "b")));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_parse_no_warn_accepts_both_separators() {
        let ids = parse_no_warn("CP0001;CP0002, CP0014,,");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("CP0002"));
    }

    #[test]
    fn test_baseline_mode_accepts_everything() {
        let engine = SuppressionEngine::new(SuppressionOptions::new(HashSet::new(), true));
        let diff = difference("T:A.B:[T:C]", "a", "b");
        assert!(engine.is_suppressed(&diff));
        assert!(engine.is_suppressed(&diff));
        assert_eq!(engine.suppressions(), vec![Suppression::from(&diff)]);
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("suppressions.json");

        let engine = SuppressionEngine::new(SuppressionOptions::default());
        engine.accept(&difference("T:A.Z:[T:C]", "a", "b"));
        engine.accept(&difference("T:A.B:[T:C]", "a", "b"));
        engine.add_suppression(Suppression::new("CP0002").with_target("M:A.B.F").baseline(true));
        assert!(engine.write_suppressions_to_file(&path).expect("write"));

        let reloaded = SuppressionEngine::load(Some(&path), SuppressionOptions::default()).expect("load");
        assert_eq!(reloaded.suppressions(), engine.suppressions());

        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"diagnosticKind\": \"CP0002\""));
        assert!(text.contains("\"isBaseline\": true"));
        assert!(text.find("T:A.B:[T:C]") < text.find("T:A.Z:[T:C]"));
        assert!(text.ends_with("]\n"));

        // 重复写入产生相同的字节
        assert!(reloaded.write_suppressions_to_file(&path).expect("rewrite"));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), text);
    }

    #[test]
    fn test_empty_set_is_not_written() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("suppressions.json");
        let engine = SuppressionEngine::new(SuppressionOptions::default());
        assert!(!engine.write_suppressions_to_file(&path).expect("write"));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_without_path_is_empty() {
        let engine = SuppressionEngine::load(None, SuppressionOptions::default()).expect("load");
        assert!(engine.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").expect("write");

        let result = SuppressionEngine::load(Some(&path), SuppressionOptions::default());
        assert!(matches!(result, Err(ApiCompatError::SuppressionFileError(_))));

        let missing = SuppressionEngine::load(Some(&dir.path().join("missing.json")), SuppressionOptions::default());
        assert!(matches!(missing, Err(ApiCompatError::SuppressionFileError(_))));
    }

    #[test]
    fn test_concurrent_accept_and_query() {
        let engine = Arc::new(SuppressionEngine::new(SuppressionOptions::new(HashSet::new(), true)));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    for i in 0..200 {
                        // 每个 id 被两个线程竞争插入
                        let diff = difference(&format!("M:A.B.F{}", (worker / 2) * 200 + i), "a", "b");
                        assert!(engine.is_suppressed(&diff));
                        assert!(engine.is_suppressed(&diff));
                    }
                });
            }
        });

        assert_eq!(engine.len(), 800);
    }
}
