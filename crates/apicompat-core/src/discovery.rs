//! 输入发现
//!
//! 把命令行给出的路径展开为具体的表面描述文件：
//! 目录展开为其中的 `*.json` 文件，文件名含 `*`/`?` 的路径按通配符匹配父目录中的文件，
//! 其余路径原样返回。结果按文件名排序。

use crate::error::{ApiCompatError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 表面描述文件的扩展名
pub const SURFACE_EXTENSION: &str = "json";

/// 展开一组输入路径，保持输入顺序
pub fn discover_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    Ok(discover_input_groups(inputs)?.into_iter().flatten().collect())
}

/// 按输入参数分组展开，第 i 组对应第 i 个输入
///
/// 逐程序集配对与引用集合选择都以输入参数为单位，而不是展开后的文件。
pub fn discover_input_groups<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<Vec<PathBuf>>> {
    inputs
        .iter()
        .map(|input| {
            let expanded = expand_input(input.as_ref())?;
            debug!(
                "Input {} expanded to {} files",
                input.as_ref().display(),
                expanded.len()
            );
            Ok(expanded)
        })
        .collect()
}

fn expand_input(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        return list_directory(input, |path| {
            path.extension().is_some_and(|ext| ext == SURFACE_EXTENSION)
        });
    }

    let Some(file_name) = input.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(vec![input.to_path_buf()]);
    };
    if !file_name.contains(['*', '?']) {
        return Ok(vec![input.to_path_buf()]);
    }

    let pattern = wildcard_regex(&file_name)?;
    let parent = match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let matches = list_directory(parent, |path| {
        path.file_name()
            .is_some_and(|name| pattern.is_match(&name.to_string_lossy()))
    })?;
    if matches.is_empty() {
        warn!("No files match {}", input.display());
    }
    Ok(matches)
}

/// 非递归列出目录中满足条件的文件
fn list_directory(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            ApiCompatError::IoError(std::io::Error::other(format!(
                "Failed to list {}: {}",
                dir.display(),
                e
            )))
        })?;
        if entry.file_type().is_file() && keep(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// 把 `*`/`?` 通配符转换为锚定的正则
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut expression = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expression.push_str(".*"),
            '?' => expression.push('.'),
            other => expression.push_str(&regex::escape(&other.to_string())),
        }
    }
    expression.push('$');
    Regex::new(&expression).map_err(|e| ApiCompatError::PatternError(format!("{pattern}: {e}")))
}
