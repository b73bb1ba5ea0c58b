//! 工作队列与运行器
//!
//! 一个工作项包含左右两侧的一组程序集描述符。运行器把每一侧解析为符号森林，
//! 交给结构比较器，再通过共享的抑制引擎过滤结果。工作项之间只共享抑制引擎，
//! 因此可以在 rayon 线程池上并行执行；单个工作项内部的遍历是单线程、确定性的。

use crate::comparer::ApiComparer;
use crate::difference::{CompatDifference, DiagnosticId};
use crate::error::{ApiCompatError, Result};
use crate::metadata::MetadataDescriptor;
use crate::model::Side;
use crate::provider::{ResolutionDiagnostic, SymbolProvider, resolve_forest};
use crate::rules::{AttributeExclusions, RuleCatalog, RuleSettings};
use crate::suppression::{Suppression, SuppressionEngine};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// 运行器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    pub strict_mode: bool,
    pub thread_pool_size: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            thread_pool_size: num_cpus::get(),
        }
    }
}

impl RunnerOptions {
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = size.max(1);
        self
    }
}

/// 一个比较单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub left: Vec<MetadataDescriptor>,
    pub right: Vec<MetadataDescriptor>,
}

fn join_ids(descriptors: &[MetadataDescriptor]) -> String {
    descriptors
        .iter()
        .map(|d| d.id.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

impl WorkItem {
    pub fn new(left: Vec<MetadataDescriptor>, right: Vec<MetadataDescriptor>) -> Self {
        Self { left, right }
    }

    pub fn left_identity(&self) -> String {
        join_ids(&self.left)
    }

    pub fn right_identity(&self) -> String {
        join_ids(&self.right)
    }
}

/// 规划工作项
///
/// 每一侧按输入参数分组，一个目录或通配符输入展开出的所有文件属于同一组。
/// 逐程序集模式下两侧组数必须相同，第 i 组左侧与第 i 组右侧配对；
/// 合并模式下生成唯一一个工作项，比较所有左侧的并集与所有右侧的并集。
pub fn plan_work_items(
    left: Vec<Vec<MetadataDescriptor>>,
    right: Vec<Vec<MetadataDescriptor>>,
    per_assembly: bool,
) -> Result<Vec<WorkItem>> {
    if !per_assembly {
        return Ok(vec![WorkItem::new(
            left.into_iter().flatten().collect(),
            right.into_iter().flatten().collect(),
        )]);
    }

    if left.len() != right.len() {
        return Err(ApiCompatError::ConfigError(format!(
            "Per-assembly comparison requires the same number of left and right inputs, got {} left and {} right",
            left.len(),
            right.len()
        )));
    }
    Ok(left
        .into_iter()
        .zip(right)
        .map(|(l, r)| WorkItem::new(l, r))
        .collect())
}

/// 为第 `index` 个输入选择引用集合
///
/// 有第 i 组时使用第 i 组，否则回退到第一组（所有输入共享）。
pub fn select_references(reference_sets: &[Vec<PathBuf>], index: usize) -> Option<&[PathBuf]> {
    reference_sets
        .get(index)
        .or_else(|| reference_sets.first())
        .map(Vec::as_slice)
}

/// 单个工作项的结果
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemResult {
    pub left_identity: String,
    pub right_identity: String,
    /// 未被抑制的差异，按比较器输出顺序
    pub differences: Vec<CompatDifference>,
    /// 未被抑制的引用解析失败
    pub unresolved: Vec<ResolutionDiagnostic>,
}

/// 一次运行的汇总结果，按入队顺序排列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub items: Vec<WorkItemResult>,
}

impl RunReport {
    pub fn differences(&self) -> impl Iterator<Item = &CompatDifference> {
        self.items.iter().flat_map(|item| item.differences.iter())
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ResolutionDiagnostic> {
        self.items.iter().flat_map(|item| item.unresolved.iter())
    }

    pub fn into_differences(self) -> Vec<CompatDifference> {
        self.items
            .into_iter()
            .flat_map(|item| item.differences)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.items.iter().all(|item| item.differences.is_empty())
    }
}

/// 工作项运行器
pub struct ApiCompatRunner {
    provider: Arc<dyn SymbolProvider>,
    comparer: ApiComparer,
    suppression: Arc<SuppressionEngine>,
    options: RunnerOptions,
    queue: Vec<WorkItem>,
}

impl ApiCompatRunner {
    pub fn new(
        provider: Arc<dyn SymbolProvider>,
        exclusions: AttributeExclusions,
        suppression: Arc<SuppressionEngine>,
        options: RunnerOptions,
    ) -> Self {
        let catalog = RuleCatalog::new(RuleSettings::new(options.strict_mode), exclusions);
        Self {
            provider,
            comparer: ApiComparer::new(Arc::new(catalog)),
            suppression,
            options,
            queue: Vec::new(),
        }
    }

    pub fn comparer(&self) -> &ApiComparer {
        &self.comparer
    }

    pub fn suppression_engine(&self) -> &Arc<SuppressionEngine> {
        &self.suppression
    }

    pub fn enqueue(&mut self, item: WorkItem) {
        debug!(
            "Enqueued work item {} -> {}",
            item.left_identity(),
            item.right_identity()
        );
        self.queue.push(item);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// 执行所有排队的工作项
    ///
    /// 任一工作项的加载失败都会终止运行，返回按入队顺序的第一个错误。
    pub fn execute_all(&mut self) -> Result<RunReport> {
        let items = std::mem::take(&mut self.queue);
        if items.is_empty() {
            return Ok(RunReport::default());
        }

        let start = Instant::now();
        info!(
            "开始执行 {} 个工作项，线程数 {}",
            items.len(),
            self.options.thread_pool_size
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.thread_pool_size)
            .build()
            .map_err(|e| ApiCompatError::ConfigError(format!("Failed to create thread pool: {e}")))?;

        let runner: &Self = self;
        let results: Vec<Result<WorkItemResult>> =
            pool.install(|| items.par_iter().map(|item| runner.execute(item)).collect());
        let items = results.into_iter().collect::<Result<Vec<_>>>()?;

        let report = RunReport { items };
        info!(
            "工作项执行完成: 差异 {}, 未解析引用 {}, 总耗时 {:?}",
            report.differences().count(),
            report.unresolved().count(),
            start.elapsed()
        );
        Ok(report)
    }

    fn execute(&self, item: &WorkItem) -> Result<WorkItemResult> {
        let left_identity = item.left_identity();
        let right_identity = item.right_identity();

        let (left, mut unresolved) = resolve_forest(self.provider.as_ref(), &item.left, Side::Left)?;
        let (right, right_unresolved) =
            resolve_forest(self.provider.as_ref(), &item.right, Side::Right)?;
        unresolved.extend(right_unresolved);

        let detected = self.comparer.get_differences(&left, &right);
        let total = detected.len();
        let differences: Vec<CompatDifference> = detected
            .into_iter()
            .map(|d| d.with_context(Some(left_identity.clone()), Some(right_identity.clone())))
            .filter(|d| !self.suppression.is_suppressed(d))
            .collect();

        let unresolved: Vec<ResolutionDiagnostic> = unresolved
            .into_iter()
            .filter(|diagnostic| {
                let error = Suppression::new(DiagnosticId::UnresolvedReference.code())
                    .with_target(diagnostic.unresolved.clone())
                    .with_sides(left_identity.clone(), right_identity.clone());
                !self.suppression.is_error_suppressed(&error)
            })
            .collect();

        debug!(
            "{} -> {}: {} differences, {} suppressed",
            left_identity,
            right_identity,
            differences.len(),
            total - differences.len()
        );

        Ok(WorkItemResult {
            left_identity,
            right_identity,
            differences,
            unresolved,
        })
    }
}
