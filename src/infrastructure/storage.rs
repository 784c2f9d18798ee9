//! 键值持久化后端
//!
//! 键是相对于数据目录的文件路径（如 `2001/questions.json`），值是完整的
//! JSON 文档。业务层只依赖 [`Storage`] trait，生产环境用 [`FileStorage`]，
//! 测试与内嵌场景用 [`MemoryStorage`]。

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};

/// 持久化后端接口
pub trait Storage: Send + Sync {
    /// 读取整个文档，键不存在返回 `Ok(None)`
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// 直接写入（无原子性保证，仅用于无并发读者的场景）
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// 原子替换：先写临时文件再重命名，读者永远看不到半成品
    fn atomic_replace(&self, key: &str, value: &str) -> StoreResult<()>;
}

/// 文件系统后端
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn ensure_parent(path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::WriteFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_of(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::ReadFailed {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_of(key);
        Self::ensure_parent(&path)?;
        fs::write(&path, value).map_err(|source| StoreError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
    }

    fn atomic_replace(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_of(key);
        Self::ensure_parent(&path)?;

        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        if let Err(source) = fs::write(&tmp, value) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::WriteFailed {
                path: tmp.display().to_string(),
                source,
            });
        }
        // rename 在同一文件系统内是原子的，目标文件被整体替换
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::ReplaceFailed {
                path: path.display().to_string(),
                source,
            });
        }
        Ok(())
    }
}

/// 内存后端，用于测试
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn atomic_replace(&self, key: &str, value: &str) -> StoreResult<()> {
        self.put(key, value)
    }
}
