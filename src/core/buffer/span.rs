// Span - 连续 piece 区段
//
// 职责：描述逻辑序列中一段连续的 piece 及其总字节长度，
//       文档的一切改动都表现为旧 span 与新 span 的交换

use crate::core::buffer::piece::{PieceId, Pieces};

/// 逻辑序列中一段连续的 piece（含两端），长度为各 piece 长度之和
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub start: Option<PieceId>,
    pub end: Option<PieceId>,
    pub len: usize,
}

impl Span {
    /// 空 span
    pub fn empty() -> Self {
        Self {
            start: None,
            end: None,
            len: 0,
        }
    }

    /// 从 start 沿 next 链走到 end（含），累加长度
    pub fn new(pieces: &Pieces, start: PieceId, end: PieceId) -> Self {
        let mut len = 0;
        let mut cur = Some(start);

        while let Some(id) = cur {
            len += pieces[id].len;
            if id == end {
                break;
            }
            cur = pieces[id].next;
        }

        Self {
            start: Some(start),
            end: Some(end),
            len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    /// 收集 span 内全部 piece 索引（沿保留的 next 链）
    pub fn piece_ids(&self, pieces: &Pieces) -> Vec<PieceId> {
        let mut ids = Vec::new();
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return ids;
        };

        let mut cur = Some(start);
        while let Some(id) = cur {
            ids.push(id);
            if id == end {
                break;
            }
            cur = pieces[id].next;
        }

        ids
    }
}
