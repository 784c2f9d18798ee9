use thiserror::Error;

/// 持久化层错误类型
///
/// 仅覆盖存储后端的读写失败；业务层使用 anyhow 携带上下文传播。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取失败
    #[error("读取失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 原子替换失败（临时文件已清理）
    #[error("原子替换失败 ({path}): {source}")]
    ReplaceFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== Result 类型别名 ==========

/// 持久化层结果类型
pub type StoreResult<T> = Result<T, StoreError>;
