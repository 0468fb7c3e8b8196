// 流式迭代器
//
// 职责：从任意字节位置起按 piece 迭代文档内容，
//       不分配不拷贝，保存操作靠它把文档流入输出映射

use crate::core::buffer::piece::PieceId;
use crate::core::buffer::piece_table::PieceTable;

/// PieceTable 的按 piece 迭代器
///
/// 产出 (文档位置, 字节切片)；首个切片可能从 piece 中途开始，
/// 哨兵等零长度切片被跳过。起始位置越界时什么也不产出
pub struct PieceChunks<'a> {
    table: &'a PieceTable,
    cur: Option<PieceId>,
    off: usize, // 首个 piece 内的起始偏移
    pos: usize, // 下一个切片的文档位置
}

impl<'a> PieceChunks<'a> {
    pub(crate) fn new(table: &'a PieceTable, pos: usize) -> Self {
        match table.locate_checked(pos) {
            Some(loc) => Self {
                table,
                cur: Some(loc.piece),
                off: loc.off,
                pos,
            },
            None => Self {
                table,
                cur: None,
                off: 0,
                pos,
            },
        }
    }
}

impl<'a> Iterator for PieceChunks<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.cur {
            let bytes = self.table.piece_bytes(id);
            let chunk = &bytes[self.off.min(bytes.len())..];

            self.cur = self.table.piece_next(id);
            self.off = 0;

            if !chunk.is_empty() {
                let pos = self.pos;
                self.pos += chunk.len();
                return Some((pos, chunk));
            }
        }

        None
    }
}
