use std::{
    fmt,
    ops::{self, Add, AddAssign, SubAssign},
    str::FromStr,
};

use crate::error::Error;

/// A closed interval of 1-based indices.
///
/// 与普通区间不同，它有两种"空"状态：
/// - `Nothing`：根本不存在区间；
/// - `EmptyAt(i)`：位于 `i` 处、长度为 0 的区间（例如正则子表达式在 `i` 处匹配了空串）。
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "IndexRangeRepr", into = "IndexRangeRepr")
)]
pub enum IndexRange {
    #[default]
    Nothing,
    EmptyAt(usize),
    /// inclusive, `first <= last`
    Span { first: usize, last: usize },
}

impl IndexRange {
    pub const NOTHING: IndexRange = IndexRange::Nothing;

    /// Builds a range from the legacy `(first, last)` pair encoding.
    ///
    /// `(0, 0)` is nothing, `last < first` or `last == 0` is empty at `first`.
    /// Index 0 is never a member: `(0, last)` becomes the span `1..=last`.
    #[inline]
    pub fn new(first: usize, last: usize) -> Self {
        if first == 0 && last == 0 {
            IndexRange::Nothing
        } else if last < first || last == 0 {
            IndexRange::EmptyAt(first)
        } else {
            IndexRange::Span {
                first: first.max(1),
                last,
            }
        }
    }

    /// Panics unless `1 <= first <= last`.
    #[inline]
    pub fn span(first: usize, last: usize) -> Self {
        assert!(
            0 < first && first <= last,
            "invalid index span {first}..={last}"
        );
        IndexRange::Span { first, last }
    }

    #[inline]
    pub const fn empty_at(index: usize) -> Self {
        IndexRange::EmptyAt(index)
    }

    /// The first index, `0` for nothing and the anchor for an empty range.
    #[inline]
    pub fn first(&self) -> usize {
        match *self {
            IndexRange::Nothing => 0,
            IndexRange::EmptyAt(index) => index,
            IndexRange::Span { first, .. } => first,
        }
    }

    /// The last index. An empty range reports `anchor - 1`, saturating at 0.
    #[inline]
    pub fn last(&self) -> usize {
        match *self {
            IndexRange::Nothing => 0,
            IndexRange::EmptyAt(index) => index.saturating_sub(1),
            IndexRange::Span { last, .. } => last,
        }
    }

    // `None` stands for an edge left of index 0.
    #[inline]
    fn effective_last(&self) -> Option<usize> {
        match *self {
            IndexRange::Nothing => None,
            IndexRange::EmptyAt(index) => index.checked_sub(1),
            IndexRange::Span { last, .. } => Some(last),
        }
    }

    #[inline]
    pub fn is_nothing(&self) -> bool {
        matches!(self, IndexRange::Nothing)
    }

    /// True for both nothing and empty-at; check [`is_nothing`](Self::is_nothing) first
    /// to tell them apart.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !matches!(self, IndexRange::Span { .. })
    }

    #[inline]
    pub fn len(&self) -> usize {
        match *self {
            IndexRange::Span { first, last } => last - first + 1,
            _ => 0,
        }
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        match *self {
            IndexRange::Span { first, last } => first <= index && index <= last,
            _ => false,
        }
    }

    /// 检查此区间是否 **包含** 另一个（可能为空的）区间 `other`。
    ///
    /// - 两者都是 nothing：包含；
    /// - 两者都是空区间：锚点相同时包含；
    /// - 空区间与非空区间：锚点严格落在 `other` 内部（`other.first < anchor <= other.last`）时包含；
    /// - 两者都非空：普通的区间包含关系。
    ///
    /// 示例: `[10, 30].contains_range(&[15, 25])` -> `true`
    ///       `empty_at(12).contains_range(&[10, 20])` -> `true`
    pub fn contains_range(&self, other: &Self) -> bool {
        match (*self, *other) {
            (IndexRange::Nothing, IndexRange::Nothing) => true,
            (IndexRange::EmptyAt(a), IndexRange::EmptyAt(b)) => a == b,
            (IndexRange::EmptyAt(anchor), IndexRange::Span { first, last }) => {
                first < anchor && anchor <= last
            }
            (
                IndexRange::Span { first, last },
                IndexRange::Span {
                    first: other_first,
                    last: other_last,
                },
            ) => first <= other_first && other_last <= last,
            _ => false,
        }
    }

    #[inline]
    pub fn set_to_nothing(&mut self) {
        *self = IndexRange::Nothing;
    }

    #[inline]
    pub fn set_to_empty_at(&mut self, index: usize) {
        *self = IndexRange::EmptyAt(index);
    }

    /// 返回能同时覆盖两个区间的最小区间。
    ///
    /// nothing 是单位元。空区间 `EmptyAt(i)` 的右边界按 `i - 1` 计算，
    /// 所以两个不相交的空区间会得到它们之间的区间。
    pub fn covering(&self, other: &Self) -> Self {
        match (self, other) {
            (IndexRange::Nothing, r) | (r, IndexRange::Nothing) => *r,
            _ => {
                let first = self.first().min(other.first());
                match self.effective_last().max(other.effective_last()) {
                    // EmptyAt(0) 与非空区间覆盖时，从下标 1 开始
                    Some(last) if last >= first && last > 0 => IndexRange::Span {
                        first: first.max(1),
                        last,
                    },
                    _ => IndexRange::EmptyAt(first),
                }
            }
        }
    }

    /// Plain interval intersection. `None` when the two do not overlap, which
    /// includes every nothing or empty operand.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        match (*self, *other) {
            (
                IndexRange::Span {
                    first: first1,
                    last: last1,
                },
                IndexRange::Span {
                    first: first2,
                    last: last2,
                },
            ) => {
                let first = first1.max(first2);
                let last = last1.min(last2);
                (first <= last).then_some(IndexRange::Span { first, last })
            }
            _ => None,
        }
    }

    /// Shifts both endpoints by a signed offset, as a text edit before the
    /// range does. Nothing stays nothing.
    pub fn shift(&mut self, delta: isize) {
        if delta >= 0 {
            *self += delta.unsigned_abs();
        } else {
            *self -= delta.unsigned_abs();
        }
    }

    /// The indices covered by the range; empty for nothing and empty-at.
    #[inline]
    pub fn indices(&self) -> ops::RangeInclusive<usize> {
        match *self {
            IndexRange::Span { first, last } => first..=last,
            #[allow(clippy::reversed_empty_ranges)]
            _ => 1..=0,
        }
    }
}

fn shift_down(index: usize, offset: usize) -> usize {
    match index.checked_sub(offset) {
        Some(index) => index,
        None => panic!("index {index} shifted below zero by {offset}"),
    }
}

impl AddAssign<usize> for IndexRange {
    #[inline]
    fn add_assign(&mut self, offset: usize) {
        match self {
            IndexRange::Nothing => {}
            IndexRange::EmptyAt(index) => *index += offset,
            IndexRange::Span { first, last } => {
                *first += offset;
                *last += offset;
            }
        }
    }
}

impl SubAssign<usize> for IndexRange {
    #[inline]
    fn sub_assign(&mut self, offset: usize) {
        match self {
            IndexRange::Nothing => {}
            IndexRange::EmptyAt(index) => *index = shift_down(*index, offset),
            IndexRange::Span { first, last } => {
                let (first, last) = (shift_down(*first, offset), shift_down(*last, offset));
                *self = IndexRange::new(first, last);
            }
        }
    }
}

impl AddAssign<IndexRange> for IndexRange {
    #[inline]
    fn add_assign(&mut self, rhs: IndexRange) {
        *self = self.covering(&rhs);
    }
}

impl Add<IndexRange> for IndexRange {
    type Output = IndexRange;
    #[inline]
    fn add(self, rhs: IndexRange) -> Self::Output {
        self.covering(&rhs)
    }
}

impl From<&ops::RangeInclusive<usize>> for IndexRange {
    fn from(rng: &ops::RangeInclusive<usize>) -> Self {
        IndexRange::new(*rng.start(), *rng.end())
    }
}

impl From<(usize, usize)> for IndexRange {
    #[inline]
    fn from(rng: (usize, usize)) -> Self {
        IndexRange::new(rng.0, rng.1)
    }
}

/// `first last`, the legacy pair. An empty range at 0 is written `0 -1`.
impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            IndexRange::Nothing => write!(f, "0 0"),
            IndexRange::EmptyAt(0) => write!(f, "0 -1"),
            IndexRange::EmptyAt(index) => write!(f, "{} {}", index, index - 1),
            IndexRange::Span { first, last } => write!(f, "{} {}", first, last),
        }
    }
}

impl FromStr for IndexRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedRange(s.to_owned());
        let mut fields = s.split_whitespace();
        let (Some(first), Some(last), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let first: usize = first.parse().map_err(|_| malformed())?;
        let last: i128 = last.parse().map_err(|_| malformed())?;
        if last < 0 {
            return Ok(IndexRange::EmptyAt(first));
        }
        let last = usize::try_from(last).map_err(|_| malformed())?;
        // "0 0" 是 nothing，除此之外 0 不能作为起点
        if first == 0 && last != 0 {
            return Err(malformed());
        }
        Ok(IndexRange::new(first, last))
    }
}

// 反序列化时校验 Span，保证 `1 <= first <= last`
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
enum IndexRangeRepr {
    Nothing,
    EmptyAt(usize),
    Span { first: usize, last: usize },
}

#[cfg(feature = "serde")]
impl TryFrom<IndexRangeRepr> for IndexRange {
    type Error = Error;

    fn try_from(repr: IndexRangeRepr) -> Result<Self, Self::Error> {
        match repr {
            IndexRangeRepr::Nothing => Ok(IndexRange::Nothing),
            IndexRangeRepr::EmptyAt(index) => Ok(IndexRange::EmptyAt(index)),
            IndexRangeRepr::Span { first, last } if 0 < first && first <= last => {
                Ok(IndexRange::Span { first, last })
            }
            IndexRangeRepr::Span { first, last } => {
                Err(Error::MalformedRange(format!("{first} {last}")))
            }
        }
    }
}

#[cfg(feature = "serde")]
impl From<IndexRange> for IndexRangeRepr {
    fn from(range: IndexRange) -> Self {
        match range {
            IndexRange::Nothing => IndexRangeRepr::Nothing,
            IndexRange::EmptyAt(index) => IndexRangeRepr::EmptyAt(index),
            IndexRange::Span { first, last } => IndexRangeRepr::Span { first, last },
        }
    }
}
