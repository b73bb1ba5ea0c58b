//! 校验编排
//!
//! 把一次命令行调用的所有选项串起来：发现输入、构造描述符、加载抑制文件和排除列表、
//! 规划并执行工作项，最后在生成模式下写出抑制文件。

use crate::difference::CompatDifference;
use crate::discovery::discover_input_groups;
use crate::error::Result;
use crate::metadata::{MetadataDescriptor, StringTransformer};
use crate::provider::{ResolutionDiagnostic, SymbolProvider};
use crate::rules::AttributeExclusions;
use crate::runner::{ApiCompatRunner, RunnerOptions, plan_work_items, select_references};
use crate::suppression::{SuppressionEngine, SuppressionOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 一侧的输入
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideInputs {
    /// 文件、目录或通配符路径
    pub assemblies: Vec<PathBuf>,
    /// 每个输入一组引用路径；只有一组时所有输入共享
    pub references: Vec<Vec<PathBuf>>,
    /// 标识变换 (模式, 替换模板)
    pub transformations: Vec<(String, String)>,
}

impl SideInputs {
    pub fn new<I: IntoIterator<Item = PathBuf>>(assemblies: I) -> Self {
        Self {
            assemblies: assemblies.into_iter().collect(),
            ..Default::default()
        }
    }

    /// 每个输入参数一组描述符，引用集合按输入参数的序号选择
    fn descriptors(&self) -> Result<Vec<Vec<MetadataDescriptor>>> {
        let transformer = if self.transformations.is_empty() {
            None
        } else {
            Some(StringTransformer::new(&self.transformations)?)
        };
        let groups = discover_input_groups(&self.assemblies)?;
        Ok(groups
            .iter()
            .enumerate()
            .map(|(index, paths)| {
                let references = select_references(&self.references, index);
                paths
                    .iter()
                    .map(|path| MetadataDescriptor::from_path(path, references, transformer.as_ref()))
                    .collect()
            })
            .collect())
    }
}

/// 一次校验的全部选项
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub left: SideInputs,
    pub right: SideInputs,
    pub strict_mode: bool,
    pub no_warn: HashSet<String>,
    pub generate_suppression_file: bool,
    pub suppression_file: Option<PathBuf>,
    pub exclude_attributes_files: Vec<PathBuf>,
    /// 逐程序集配对，而不是比较合并后的表面
    pub per_assembly: bool,
    /// 为空时使用 CPU 核心数
    pub thread_pool_size: Option<usize>,
}

/// 校验结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    /// 未被抑制的差异，按工作项入队顺序
    pub differences: Vec<CompatDifference>,
    pub unresolved: Vec<ResolutionDiagnostic>,
    /// 生成模式下是否写出了抑制文件
    pub suppression_file_written: bool,
}

impl ValidationOutcome {
    pub fn is_success(&self) -> bool {
        self.differences.is_empty()
    }
}

/// 运行一次完整校验
pub fn validate(options: &ValidationOptions, provider: Arc<dyn SymbolProvider>) -> Result<ValidationOutcome> {
    // 即将重新生成的抑制文件不存在时按空基线处理
    let suppression_path: Option<&Path> = options
        .suppression_file
        .as_deref()
        .filter(|path| !(options.generate_suppression_file && !path.exists()));

    let engine = Arc::new(SuppressionEngine::load(
        suppression_path,
        SuppressionOptions::new(options.no_warn.clone(), options.generate_suppression_file),
    )?);
    let exclusions = AttributeExclusions::from_files(&options.exclude_attributes_files)?;

    let left = options.left.descriptors()?;
    let right = options.right.descriptors()?;
    info!(
        "Comparing {} left files against {} right files ({})",
        left.iter().map(Vec::len).sum::<usize>(),
        right.iter().map(Vec::len).sum::<usize>(),
        if options.per_assembly { "per assembly" } else { "merged" }
    );
    let items = plan_work_items(left, right, options.per_assembly)?;

    let mut runner_options = RunnerOptions::default().with_strict_mode(options.strict_mode);
    if let Some(size) = options.thread_pool_size {
        runner_options = runner_options.with_thread_pool_size(size);
    }
    let mut runner = ApiCompatRunner::new(provider, exclusions, Arc::clone(&engine), runner_options);
    for item in items {
        runner.enqueue(item);
    }
    let report = runner.execute_all()?;

    let mut outcome = ValidationOutcome {
        unresolved: report.unresolved().cloned().collect(),
        differences: report.into_differences(),
        suppression_file_written: false,
    };

    if options.generate_suppression_file {
        if let Some(path) = options.suppression_file.as_deref() {
            outcome.suppression_file_written = engine.write_suppressions_to_file(path)?;
            if outcome.suppression_file_written {
                info!("Suppression file written to {}", path.display());
            } else {
                info!("No differences to baseline, {} left untouched", path.display());
            }
        } else {
            debug!("Suppression generation requested without a destination");
        }
        outcome.differences.clear();
    }

    Ok(outcome)
}
