//! 命令行接口模块
//!
//! 提供命令行参数解析，并把参数转换为核心库的校验选项

use apicompat_core::{ApiCompatError, Result, SideInputs, ValidationOptions, parse_no_warn};
use clap::Parser;
use std::path::PathBuf;

/// apicompat - API 兼容性校验工具
///
/// 比较同一个库两个版本的公开表面描述，报告不兼容的变更，
/// 并通过抑制文件维护已接受的差异基线。
#[derive(Parser, Debug)]
#[command(name = "apicompat")]
#[command(author = "apicompat contributors")]
#[command(version = "0.1.0")]
#[command(about = "Detects breaking changes between two versions of a library's public API surface")]
#[command(
    long_about = "apicompat compares the public surface of a baseline (left) and a candidate (right) version of a library, reports incompatible differences, and maintains a suppression baseline so that only new incompatibilities fail the build."
)]
pub struct Cli {
    /// 左侧（基线）输入
    #[arg(
        short = 'l',
        long = "left",
        required = true,
        num_args = 1..,
        value_name = "PATH",
        help = "Baseline surface files, directories or wildcard paths"
    )]
    pub left: Vec<PathBuf>,

    /// 右侧（候选）输入
    #[arg(
        short = 'r',
        long = "right",
        required = true,
        num_args = 1..,
        value_name = "PATH",
        help = "Candidate surface files, directories or wildcard paths"
    )]
    pub right: Vec<PathBuf>,

    /// 左侧引用集合，每次出现为一组
    #[arg(
        long = "left-references",
        value_name = "P1,P2",
        help = "Comma separated reference assemblies for the left inputs (repeat once per input)"
    )]
    pub left_references: Vec<String>,

    /// 右侧引用集合，每次出现为一组
    #[arg(
        long = "right-references",
        value_name = "P1,P2",
        help = "Comma separated reference assemblies for the right inputs (repeat once per input)"
    )]
    pub right_references: Vec<String>,

    #[arg(long = "strict-mode", help = "Also report declarations that only exist on the right")]
    pub strict_mode: bool,

    /// 无条件抑制的诊断 id
    #[arg(
        long = "no-warn",
        env = "APICOMPAT_NOWARN",
        value_name = "IDS",
        help = "Diagnostic ids to suppress unconditionally, separated by ';' or ','"
    )]
    pub no_warn: Option<String>,

    #[arg(
        long = "generate-suppression-file",
        help = "Accept every difference and write it to the suppression file"
    )]
    pub generate_suppression_file: bool,

    #[arg(
        long = "suppression-file",
        value_name = "FILE",
        help = "Suppression file to read accepted differences from (or to generate)"
    )]
    pub suppression_file: Option<PathBuf>,

    /// 特性排除列表
    #[arg(
        long = "exclude-attributes-file",
        value_name = "FILE",
        help = "File listing attribute type ids to ignore, one per line"
    )]
    pub exclude_attributes_files: Vec<PathBuf>,

    #[arg(
        long = "per-assembly",
        help = "Compare the i-th left input with the i-th right input instead of the merged surfaces"
    )]
    pub per_assembly: bool,

    /// 左侧标识变换，每次出现为 (模式, 替换模板)
    #[arg(
        long = "left-transformation",
        num_args = 2,
        value_names = ["PATTERN", "REPLACEMENT"],
        help = "Regex and replacement template deriving the left assembly identity from its path"
    )]
    pub left_transformation: Vec<String>,

    #[arg(
        long = "right-transformation",
        num_args = 2,
        value_names = ["PATTERN", "REPLACEMENT"],
        help = "Regex and replacement template deriving the right assembly identity from its path"
    )]
    pub right_transformation: Vec<String>,

    /// 工作线程数
    #[arg(
        long = "threads",
        value_name = "N",
        help = "Number of worker threads (defaults to the number of CPUs)",
        value_parser = clap::value_parser!(u32).range(1..=256)
    )]
    pub threads: Option<u32>,

    /// 详细输出
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging output")]
    pub verbose: bool,
}

/// 应用程序配置信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub left: Vec<PathBuf>,
    pub right: Vec<PathBuf>,
    pub left_references: Vec<Vec<PathBuf>>,
    pub right_references: Vec<Vec<PathBuf>>,
    pub strict_mode: bool,
    pub no_warn: Option<String>,
    pub generate_suppression_file: bool,
    pub suppression_file: Option<PathBuf>,
    pub exclude_attributes_files: Vec<PathBuf>,
    pub per_assembly: bool,
    pub left_transformations: Vec<(String, String)>,
    pub right_transformations: Vec<(String, String)>,
    pub threads: Option<usize>,
    pub verbose: bool,
}

/// 把每次出现的逗号列表拆成一组路径
fn split_reference_sets(values: Vec<String>) -> Vec<Vec<PathBuf>> {
    values
        .into_iter()
        .map(|set| {
            set.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect()
        })
        .collect()
}

fn pair_up(values: Vec<String>) -> Vec<(String, String)> {
    values
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            left: cli.left,
            right: cli.right,
            left_references: split_reference_sets(cli.left_references),
            right_references: split_reference_sets(cli.right_references),
            strict_mode: cli.strict_mode,
            no_warn: cli.no_warn,
            generate_suppression_file: cli.generate_suppression_file,
            suppression_file: cli.suppression_file,
            exclude_attributes_files: cli.exclude_attributes_files,
            per_assembly: cli.per_assembly,
            left_transformations: pair_up(cli.left_transformation),
            right_transformations: pair_up(cli.right_transformation),
            threads: cli.threads.map(|n| n as usize),
            verbose: cli.verbose,
        }
    }
}

impl Config {
    /// 转换为核心库的校验选项
    pub fn to_validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            left: SideInputs {
                assemblies: self.left.clone(),
                references: self.left_references.clone(),
                transformations: self.left_transformations.clone(),
            },
            right: SideInputs {
                assemblies: self.right.clone(),
                references: self.right_references.clone(),
                transformations: self.right_transformations.clone(),
            },
            strict_mode: self.strict_mode,
            no_warn: self.no_warn.as_deref().map(parse_no_warn).unwrap_or_default(),
            generate_suppression_file: self.generate_suppression_file,
            suppression_file: self.suppression_file.clone(),
            exclude_attributes_files: self.exclude_attributes_files.clone(),
            per_assembly: self.per_assembly,
            thread_pool_size: self.threads,
        }
    }
}

impl Cli {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 验证参数的有效性
    pub fn validate(&self) -> Result<()> {
        if self.generate_suppression_file && self.suppression_file.is_none() {
            return Err(ApiCompatError::ConfigError(
                "--generate-suppression-file requires --suppression-file".to_string(),
            ));
        }

        if let Some(path) = &self.suppression_file {
            // 生成模式下文件可以不存在，但所在目录必须存在
            if !self.generate_suppression_file && !path.exists() {
                return Err(ApiCompatError::ConfigError(format!(
                    "Suppression file does not exist: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(ApiCompatError::ConfigError(format!(
                        "Suppression file directory does not exist: {}",
                        parent.display()
                    )));
                }
            }
        }

        for file in &self.exclude_attributes_files {
            if !file.is_file() {
                return Err(ApiCompatError::ConfigError(format!(
                    "Attribute exclusion file does not exist: {}",
                    file.display()
                )));
            }
        }

        if self.per_assembly && self.left.len() != self.right.len() {
            return Err(ApiCompatError::ConfigError(format!(
                "--per-assembly requires the same number of left and right inputs, got {} and {}",
                self.left.len(),
                self.right.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("apicompat").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn test_minimal_arguments() {
        let cli = parse(&["-l", "v1/A.json", "-r", "v2/A.json"]);
        assert!(cli.validate().is_ok());

        let config = Config::from(cli);
        assert!(!config.strict_mode);
        assert_eq!(config.left, vec![PathBuf::from("v1/A.json")]);
        assert!(config.to_validation_options().no_warn.is_empty());
    }

    #[test]
    fn test_reference_sets_and_transformations() {
        let cli = parse(&[
            "--left", "v1/A.json", "v1/B.json",
            "--right", "v2/A.json", "v2/B.json",
            "--left-references", "refs/System.Runtime.json,refs/Other.json",
            "--left-references", "refs/System.Runtime.json",
            "--left-transformation", r"^v\d+/", "",
            "--right-transformation", r"^v\d+/", "",
            "--no-warn", "CP0001;CP0002",
            "--threads", "4",
        ]);
        let config = Config::from(cli);

        assert_eq!(config.left_references.len(), 2);
        assert_eq!(config.left_references[0].len(), 2);
        assert!(config.right_references.is_empty());
        assert_eq!(config.left_transformations, vec![(r"^v\d+/".to_string(), String::new())]);

        let options = config.to_validation_options();
        assert_eq!(options.no_warn.len(), 2);
        assert_eq!(options.thread_pool_size, Some(4));
        assert_eq!(options.right.transformations.len(), 1);
    }

    #[test]
    fn test_generate_requires_suppression_file() {
        let cli = parse(&["-l", "a.json", "-r", "b.json", "--generate-suppression-file"]);
        assert!(matches!(cli.validate(), Err(ApiCompatError::ConfigError(_))));
    }

    #[test]
    fn test_per_assembly_count_mismatch() {
        let cli = parse(&["-l", "a.json", "b.json", "-r", "c.json", "--per-assembly"]);
        assert!(matches!(cli.validate(), Err(ApiCompatError::ConfigError(_))));
    }

    #[test]
    fn test_missing_inputs_are_rejected_by_parser() {
        let result = Cli::try_parse_from(["apicompat", "-l", "a.json"]);
        assert!(result.is_err());
    }
}
