// Editor Core - 编辑器核心
//
// 职责：管理 Piece Table 缓冲区状态，
//       提供插入、删除、撤销重做与原子保存

pub mod buffer;

pub use buffer::{BufferError, PieceChunks, PieceTable};
