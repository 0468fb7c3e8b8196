// 缓冲区错误类型
//
// 职责：定义缓冲区操作的错误分类，由调用方决定如何处理

use std::path::PathBuf;

use thiserror::Error;

/// 缓冲区操作错误
#[derive(Debug, Error)]
pub enum BufferError {
    /// 操作范围超出文档末尾
    #[error("位置超出文档范围: {pos} + {len} > {size}")]
    OutOfBounds {
        pos: usize,
        len: usize,
        size: usize,
    },

    /// 加载目标不是常规文件
    #[error("不是常规文件: {}", .0.display())]
    NotRegular(PathBuf),

    /// 底层文件系统操作失败
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}
