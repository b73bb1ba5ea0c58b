//! 程序集描述符与标识变换

use crate::error::{ApiCompatError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// 一个待比较程序集的描述
///
/// `id` 是逻辑标识，默认等于文件路径，可通过 [`StringTransformer`] 与路径解耦，
/// 用于填充差异记录和抑制项中的 left/right。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataDescriptor {
    pub name: String,
    pub id: String,
    pub full_path: PathBuf,
    /// 解析引用时可用的程序集路径，为空表示不做解析检查
    pub references: BTreeSet<PathBuf>,
}

impl MetadataDescriptor {
    pub fn new(full_path: impl Into<PathBuf>) -> Self {
        let full_path = full_path.into();
        let name = full_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = full_path.to_string_lossy().into_owned();
        Self {
            name,
            id,
            full_path,
            references: BTreeSet::new(),
        }
    }

    /// 由路径构造，可选地应用标识变换并附加引用集合
    pub fn from_path(
        path: &Path,
        references: Option<&[PathBuf]>,
        transformer: Option<&StringTransformer>,
    ) -> Self {
        let mut descriptor = Self::new(path);
        if let Some(transformer) = transformer {
            descriptor.id = transformer.transform(&descriptor.id);
        }
        if let Some(references) = references {
            descriptor.references = references.iter().cloned().collect();
        }
        descriptor
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_references<I: IntoIterator<Item = PathBuf>>(mut self, references: I) -> Self {
        self.references = references.into_iter().collect();
        self
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }
}

impl fmt::Display for MetadataDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// 基于正则的字符串变换
///
/// 按顺序应用每一对 (模式, 替换模板)，模板中可用 `$1`、`${name}` 引用捕获组。
#[derive(Debug, Clone, Default)]
pub struct StringTransformer {
    rules: Vec<(Regex, String)>,
}

impl StringTransformer {
    pub fn new<S: AsRef<str>>(patterns: &[(S, S)]) -> Result<Self> {
        let rules = patterns
            .iter()
            .map(|(pattern, replacement)| {
                Regex::new(pattern.as_ref())
                    .map(|regex| (regex, replacement.as_ref().to_string()))
                    .map_err(|e| {
                        ApiCompatError::PatternError(format!("{}: {}", pattern.as_ref(), e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn transform(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |current, (regex, replacement)| {
                regex.replace_all(&current, replacement.as_str()).into_owned()
            })
    }
}
