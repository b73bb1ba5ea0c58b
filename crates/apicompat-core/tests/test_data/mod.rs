//! 测试数据集模块
//!
//! 在临时目录中生成左右两个版本的表面描述文件

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 测试数据集结构
pub struct TestDataSet {
    pub temp_dir: TempDir,
    pub left_dir: PathBuf,
    pub right_dir: PathBuf,
}

impl TestDataSet {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let left_dir = temp_dir.path().join("left");
        let right_dir = temp_dir.path().join("right");
        std::fs::create_dir_all(&left_dir)?;
        std::fs::create_dir_all(&right_dir)?;
        Ok(Self {
            temp_dir,
            left_dir,
            right_dir,
        })
    }

    pub fn write_left(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        write(&self.left_dir, name, content)
    }

    pub fn write_right(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        write(&self.right_dir, name, content)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// 特性被移除的场景
    pub fn attribute_removed() -> std::io::Result<Self> {
        let data = Self::new()?;
        data.write_left("CompatTests.json", FIRST_WITH_SERIALIZABLE)?;
        data.write_right("CompatTests.json", FIRST_WITHOUT_SERIALIZABLE)?;
        Ok(data)
    }

    /// 方法特性被修改、移除和新增的场景
    pub fn method_attributes_changed() -> std::io::Result<Self> {
        let data = Self::new()?;
        data.write_left("CompatTests.json", METHOD_LEFT)?;
        data.write_right("CompatTests.json", METHOD_RIGHT)?;
        Ok(data)
    }
}

fn write(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

pub const FIRST_WITH_SERIALIZABLE: &str = r#"{
  "name": "CompatTests",
  "namespaces": [
    {
      "name": "CompatTests",
      "types": [
        {
          "name": "First",
          "attributes": [
            { "type": "T:System.SerializableAttribute" },
            {
              "type": "T:CompatTests.FooAttribute",
              "arguments": [{ "kind": "string", "value": "S" }],
              "namedArguments": {
                "A": { "kind": "bool", "value": true },
                "B": { "kind": "int", "value": 3 }
              }
            }
          ]
        },
        {
          "name": "FooAttribute",
          "members": [
            {
              "kind": "constructor",
              "parameters": [{ "name": "s", "type": "System.String" }]
            },
            { "kind": "property", "name": "A", "returnType": "System.Boolean" },
            { "kind": "property", "name": "B", "returnType": "System.Int32" }
          ]
        }
      ]
    }
  ]
}
"#;

pub const FIRST_WITHOUT_SERIALIZABLE: &str = r#"{
  "name": "CompatTests",
  "namespaces": [
    {
      "name": "CompatTests",
      "types": [
        {
          "name": "First",
          "attributes": [
            {
              "type": "T:CompatTests.FooAttribute",
              "arguments": [{ "kind": "string", "value": "S" }],
              "namedArguments": {
                "B": { "kind": "int", "value": 3 },
                "A": { "kind": "bool", "value": true }
              }
            }
          ]
        },
        {
          "name": "FooAttribute",
          "members": [
            {
              "kind": "constructor",
              "parameters": [{ "name": "s", "type": "System.String" }]
            },
            { "kind": "property", "name": "A", "returnType": "System.Boolean" },
            { "kind": "property", "name": "B", "returnType": "System.Int32" }
          ]
        }
      ]
    }
  ]
}
"#;

pub const METHOD_LEFT: &str = r#"{
  "name": "CompatTests",
  "namespaces": [
    {
      "name": "CompatTests",
      "types": [
        {
          "name": "First",
          "members": [
            {
              "kind": "method",
              "name": "F",
              "attributes": [
                {
                  "type": "T:CompatTests.FooAttribute",
                  "arguments": [{ "kind": "string", "value": "S" }],
                  "namedArguments": {
                    "A": { "kind": "bool", "value": true },
                    "B": { "kind": "int", "value": 3 }
                  }
                },
                { "type": "T:CompatTests.BarAttribute" }
              ]
            }
          ]
        }
      ]
    }
  ]
}
"#;

pub const METHOD_RIGHT: &str = r#"{
  "name": "CompatTests",
  "namespaces": [
    {
      "name": "CompatTests",
      "types": [
        {
          "name": "First",
          "members": [
            {
              "kind": "method",
              "name": "F",
              "attributes": [
                {
                  "type": "T:CompatTests.FooAttribute",
                  "arguments": [{ "kind": "string", "value": "T" }]
                },
                { "type": "T:CompatTests.BazAttribute" }
              ]
            }
          ]
        }
      ]
    }
  ]
}
"#;
