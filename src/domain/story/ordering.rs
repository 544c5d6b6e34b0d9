//! 章节顺序计算
//!
//! 纯函数：插入/移动/删除时需要平移的区间。存储层按这里给出的区间
//! 执行一次范围更新，再写入目标条目。
//!
//! 顺序值从 0 开始，对同一故事连续且不重复。

use super::StoryError;

/// 顺序基准值
pub const ORDER_BASE: i64 = 0;

/// 需要平移的闭区间 `[from, to]`（`to` 为 None 表示无上界）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRange {
    pub from: i64,
    pub to: Option<i64>,
    pub delta: i64,
}

impl ShiftRange {
    /// order >= from 的条目整体后移一位
    pub fn open_slot_at(pos: i64) -> Self {
        Self {
            from: pos,
            to: None,
            delta: 1,
        }
    }

    /// order > pos 的条目整体前移一位
    pub fn close_gap_after(pos: i64) -> Self {
        Self {
            from: pos + 1,
            to: None,
            delta: -1,
        }
    }

    pub fn contains(&self, order: i64) -> bool {
        order >= self.from && self.to.map_or(true, |to| order <= to)
    }

    /// 对单个顺序值应用平移（区间外保持不变）
    pub fn apply(&self, order: i64) -> i64 {
        if self.contains(order) {
            order + self.delta
        } else {
            order
        }
    }
}

/// 校验调用方给出的位置
pub fn validate_position(pos: i64) -> Result<i64, StoryError> {
    if pos < ORDER_BASE {
        return Err(StoryError::InvalidPosition(pos));
    }
    Ok(pos)
}

/// 插入位置夹到 `[0, len]`，超出末尾时追加
pub fn clamp_insert_position(pos: i64, len: i64) -> i64 {
    pos.clamp(ORDER_BASE, ORDER_BASE + len.max(0))
}

/// 移动目标夹到 `[0, len - 1]`
pub fn clamp_move_position(pos: i64, len: i64) -> i64 {
    let last = ORDER_BASE + (len - 1).max(0);
    pos.clamp(ORDER_BASE, last)
}

/// 移动一个条目时，夹在新旧位置之间的兄弟条目各平移一位
///
/// 返回 None 表示新旧位置相同，无需任何写入。
pub fn plan_move(old_pos: i64, new_pos: i64) -> Option<ShiftRange> {
    if new_pos == old_pos {
        return None;
    }
    if new_pos > old_pos {
        Some(ShiftRange {
            from: old_pos + 1,
            to: Some(new_pos),
            delta: -1,
        })
    } else {
        Some(ShiftRange {
            from: new_pos,
            to: Some(old_pos - 1),
            delta: 1,
        })
    }
}

/// 顺序值是否构成从基准值开始的连续整数序列
///
/// 入参需已按升序排列。
pub fn is_contiguous(orders: &[i64]) -> bool {
    orders
        .iter()
        .enumerate()
        .all(|(i, order)| *order == ORDER_BASE + i as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 在内存序列上执行一次移动，用于校验平移区间
    fn simulate_move(orders: &[(char, i64)], target: char, new_pos: i64) -> Vec<(char, i64)> {
        let old_pos = orders.iter().find(|(c, _)| *c == target).unwrap().1;
        let new_pos = clamp_move_position(new_pos, orders.len() as i64);
        let mut result: Vec<(char, i64)> = match plan_move(old_pos, new_pos) {
            None => orders.to_vec(),
            Some(range) => orders
                .iter()
                .map(|(c, o)| {
                    if *c == target {
                        (*c, new_pos)
                    } else {
                        (*c, range.apply(*o))
                    }
                })
                .collect(),
        };
        result.sort_by_key(|(_, o)| *o);
        result
    }

    #[test]
    fn test_validate_position() {
        assert_eq!(validate_position(0), Ok(0));
        assert_eq!(validate_position(-1), Err(StoryError::InvalidPosition(-1)));
    }

    #[test]
    fn test_clamp_insert_position() {
        assert_eq!(clamp_insert_position(0, 0), 0);
        assert_eq!(clamp_insert_position(5, 2), 2);
        assert_eq!(clamp_insert_position(1, 2), 1);
    }

    #[test]
    fn test_clamp_move_position() {
        assert_eq!(clamp_move_position(9, 3), 2);
        assert_eq!(clamp_move_position(0, 1), 0);
        assert_eq!(clamp_move_position(3, 0), 0);
    }

    #[test]
    fn test_open_slot_and_close_gap() {
        let open = ShiftRange::open_slot_at(1);
        assert_eq!(open.apply(0), 0);
        assert_eq!(open.apply(1), 2);

        let close = ShiftRange::close_gap_after(1);
        assert_eq!(close.apply(1), 1);
        assert_eq!(close.apply(2), 1);
    }

    #[test]
    fn test_plan_move_noop() {
        assert_eq!(plan_move(2, 2), None);
    }

    #[test]
    fn test_move_forward_keeps_sequence_contiguous() {
        let seq = [('a', 0), ('b', 1), ('c', 2), ('d', 3)];
        let moved = simulate_move(&seq, 'a', 2);
        assert_eq!(moved, vec![('b', 0), ('c', 1), ('a', 2), ('d', 3)]);
    }

    #[test]
    fn test_move_backward_keeps_sequence_contiguous() {
        let seq = [('a', 0), ('b', 1), ('c', 2), ('d', 3)];
        let moved = simulate_move(&seq, 'd', 1);
        assert_eq!(moved, vec![('a', 0), ('d', 1), ('b', 2), ('c', 3)]);
    }

    #[test]
    fn test_move_past_end_is_clamped() {
        let seq = [('a', 0), ('b', 1), ('c', 2)];
        let moved = simulate_move(&seq, 'a', 10);
        assert_eq!(moved, vec![('b', 0), ('c', 1), ('a', 2)]);
        let orders: Vec<i64> = moved.iter().map(|(_, o)| *o).collect();
        assert!(is_contiguous(&orders));
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[0, 1, 2]));
        assert!(!is_contiguous(&[0, 2]));
        assert!(!is_contiguous(&[0, 0, 1]));
        assert!(!is_contiguous(&[1, 2]));
    }
}
