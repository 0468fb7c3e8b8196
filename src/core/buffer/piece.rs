// Piece 管理
//
// 职责：以索引寻址的 arena 存放所有 piece，
//       piece 解除链接后仍然保留，供撤销重做重新接回

use std::ops::{Index, IndexMut};

/// arena 内的稳定索引，同时充当调试用的 piece 编号
pub type PieceId = usize;

/// 头哨兵，固定占据 arena 槽位 0
pub const BEGIN: PieceId = 0;
/// 尾哨兵，固定占据 arena 槽位 1
pub const END: PieceId = 1;

/// Piece 引用的后备区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceSource {
    /// 哨兵，不持有数据
    Sentinel,
    /// 原始内存映射区域
    Original,
    /// 第 buffer 个插入缓冲区
    Add { buffer: usize },
}

/// Piece 描述符
///
/// 初始化后除 prev/next 链接外不再改动；
/// 链接只由 span 交换改写。
#[derive(Debug, Clone)]
pub struct Piece {
    pub source: PieceSource,
    pub start: usize, // 在后备区域中的起始偏移
    pub len: usize,   // 字节长度
    pub prev: Option<PieceId>,
    pub next: Option<PieceId>,
}

/// 文档中的一个字节位置：所在 piece 与 piece 内偏移
///
/// 边界位置归属约定：内部边界返回前一个 piece（off == len），
/// 插入删除算法都依赖这一约定来识别"追加在 piece 之后"
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub piece: PieceId,
    pub off: usize,
}

/// Piece arena
///
/// 槽位向量本身就是分配顺序链表的替代：整体释放交给 Drop。
/// 单独释放只发生在 redo 栈截断时，通过空闲列表复用槽位。
#[derive(Debug)]
pub struct Pieces {
    slots: Vec<Piece>,
    free: Vec<PieceId>,
}

impl Pieces {
    /// 创建只含两个互链哨兵的 arena
    pub fn new() -> Self {
        let begin = Piece {
            source: PieceSource::Sentinel,
            start: 0,
            len: 0,
            prev: None,
            next: Some(END),
        };
        let end = Piece {
            source: PieceSource::Sentinel,
            start: 0,
            len: 0,
            prev: Some(BEGIN),
            next: None,
        };

        Self {
            slots: vec![begin, end],
            free: Vec::new(),
        }
    }

    /// 分配一个 piece，返回稳定索引
    pub fn alloc(
        &mut self,
        source: PieceSource,
        start: usize,
        len: usize,
        prev: Option<PieceId>,
        next: Option<PieceId>,
    ) -> PieceId {
        let piece = Piece {
            source,
            start,
            len,
            prev,
            next,
        };

        match self.free.pop() {
            Some(id) => {
                self.slots[id] = piece;
                id
            }
            None => {
                self.slots.push(piece);
                self.slots.len() - 1
            }
        }
    }

    /// 释放一个 piece 槽位（仅由 redo 截断调用，哨兵永不释放）
    pub fn free(&mut self, id: PieceId) {
        debug_assert!(id != BEGIN && id != END);
        self.free.push(id);
    }

    /// 历史上分配过的槽位总数（含哨兵），调试用
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }
}

impl Default for Pieces {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<PieceId> for Pieces {
    type Output = Piece;

    fn index(&self, id: PieceId) -> &Piece {
        &self.slots[id]
    }
}

impl IndexMut<PieceId> for Pieces {
    fn index_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.slots[id]
    }
}
