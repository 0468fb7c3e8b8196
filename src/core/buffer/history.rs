// 编辑历史
//
// 职责：记录每次编辑换入换出的 span 对（Change），
//       按快照边界归组为 Action，供撤销重做栈使用

use std::time::SystemTime;

use crate::core::buffer::span::Span;

/// 一次 span 交换的完整记录
///
/// old 是被换出的 span，new 是换入的 span；
/// 两侧 piece 都保留在 arena 中，交换因此可逆
#[derive(Debug)]
pub struct Change {
    pub old: Span,
    pub new: Span,
}

/// 两个快照点之间的全部 Change，用户可见的撤销单位
#[derive(Debug)]
pub struct Action {
    /// 单调递增编号，保存点按此判定身份
    pub id: u64,
    /// Action 创建时刻（首个 Change 记录时）
    pub at: SystemTime,
    /// 按时间顺序排列；撤销时倒序回放
    pub changes: Vec<Change>,
}

impl Action {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            at: SystemTime::now(),
            changes: Vec::new(),
        }
    }
}
