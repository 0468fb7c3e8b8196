// Piece Table 缓冲区 - 文本缓冲区核心实现
//
// 职责：使用 Piece Table 数据结构管理文档字节内容，
//       支持任意位置插入删除、撤销重做、内存映射与原子保存

mod chunk_iter;
mod error;
mod history;
mod insert_buffer;
mod mmap;
mod piece;
mod piece_table;
mod span;

// 重新导出
pub use self::chunk_iter::PieceChunks;
pub use self::error::BufferError;
pub use self::history::{Action, Change};
pub use self::insert_buffer::InsertBuffers;
pub use self::mmap::OriginalBuffer;
pub use self::piece::{Location, Piece, PieceId, PieceSource, Pieces, BEGIN, END};
pub use self::piece_table::PieceTable;
pub use self::span::Span;

/// 插入缓冲区默认容量（单次插入超过时按需放大）
pub const INSERT_BUFFER_SIZE: usize = 1 << 20; // 1MiB
