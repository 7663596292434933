use std::{
    fmt, iter,
    ops::{AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, Sub, SubAssign},
    slice,
};

use log::{debug, trace};

use crate::{
    error::{Error, Result},
    random::KlRand,
    range::IndexRange,
    stream::MAX_SET_SIZE,
};

fn check_set_size(set_size: usize) -> Result<()> {
    if set_size == 0 {
        return Err(Error::EmptyUniverse);
    }
    if set_size as u64 >= MAX_SET_SIZE {
        return Err(Error::UniverseTooLarge { size: set_size });
    }
    Ok(())
}

/// A subset of the universe `1..=original_set_size`.
///
/// Members are kept as a sorted, duplicate-free list of indices, so iteration
/// costs O(members) no matter how large the universe is.
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SubsetRepr", into = "SubsetRepr")
)]
pub struct Subset {
    original_set_size: usize,
    indices: Vec<usize>,
}

impl Subset {
    /// Panics if `set_size` is 0 or has more than 10 digits.
    pub fn new(set_size: usize) -> Self {
        assert!(set_size > 0, "subset universe must not be empty");
        assert!(
            (set_size as u64) < MAX_SET_SIZE,
            "subset universe of {set_size} does not fit the stream header"
        );
        Subset {
            original_set_size: set_size,
            indices: Vec::new(),
        }
    }

    pub fn try_new(set_size: usize) -> Result<Self> {
        check_set_size(set_size)?;
        Ok(Subset::new(set_size))
    }

    /// The whole universe.
    pub fn full(set_size: usize) -> Self {
        let mut subset = Subset::new(set_size);
        subset.add_all();
        subset
    }

    pub fn with_members<I: IntoIterator<Item = usize>>(set_size: usize, members: I) -> Self {
        let mut subset = Subset::new(set_size);
        for index in members {
            subset.add(index);
        }
        subset
    }

    /// Like [`with_members`](Self::with_members), but reports an empty
    /// universe or an out-of-universe member instead of panicking.
    pub fn try_with_members<I: IntoIterator<Item = usize>>(
        set_size: usize,
        members: I,
    ) -> Result<Self> {
        check_set_size(set_size)?;
        let mut indices: Vec<usize> = members.into_iter().collect();
        if let Some(&index) = indices.iter().find(|&&i| i == 0 || i > set_size) {
            return Err(Error::IndexOutOfUniverse {
                index,
                size: set_size,
            });
        }
        indices.sort_unstable();
        indices.dedup();
        Ok(Subset::from_sorted(set_size, indices))
    }

    // 调用方已保证有序、无重复且都在全集内
    pub(crate) fn from_sorted(set_size: usize, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(indices.last().is_none_or(|&last| last <= set_size));
        Subset {
            original_set_size: set_size,
            indices,
        }
    }

    #[inline]
    pub fn original_set_size(&self) -> usize {
        self.original_set_size
    }

    /// Changes the universe size without renumbering the members. The current
    /// members must still fit.
    pub fn set_original_set_size(&mut self, size: usize) {
        assert!(size > 0, "subset universe must not be empty");
        assert!(
            (size as u64) < MAX_SET_SIZE,
            "subset universe of {size} does not fit the stream header"
        );
        assert!(
            self.indices.last().is_none_or(|&last| last <= size),
            "subset member {:?} does not fit in a universe of {size}",
            self.indices.last()
        );
        self.original_set_size = size;
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> iter::Copied<slice::Iter<'_, usize>> {
        self.indices.iter().copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    #[inline]
    pub fn first(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    #[inline]
    pub fn index_valid(&self, index: usize) -> bool {
        1 <= index && index <= self.original_set_size
    }

    #[inline]
    fn assert_index_valid(&self, index: usize) {
        assert!(
            self.index_valid(index),
            "index {index} is outside the universe 1..={}",
            self.original_set_size
        );
    }

    #[inline]
    fn assert_same_universe(&self, other: &Subset) {
        assert_eq!(
            self.original_set_size, other.original_set_size,
            "subsets belong to different universes"
        );
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Returns false if `index` was already a member.
    pub fn add(&mut self, index: usize) -> bool {
        self.assert_index_valid(index);
        match self.indices.binary_search(&index) {
            Ok(_) => false,
            Err(pos) => {
                self.indices.insert(pos, index);
                true
            }
        }
    }

    /// Returns false if `index` was not a member.
    pub fn remove(&mut self, index: usize) -> bool {
        match self.indices.binary_search(&index) {
            Ok(pos) => {
                self.indices.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// 把 `start..=end` 中的所有下标加入子集。
    ///
    /// 先二分定位已有成员中落在区间内的那一段，再整体替换为 `start..=end`，
    /// 所以代价是 O(成员数 + 区间长度)，不会逐个插入。
    pub fn add_range(&mut self, start: usize, end: usize) {
        self.assert_index_valid(start);
        self.assert_index_valid(end);
        assert!(start <= end, "invalid range {start}..={end}");
        let lo = self.indices.partition_point(|&i| i < start);
        let hi = self.indices.partition_point(|&i| i <= end);
        if hi - lo == end - start + 1 {
            return;
        }
        self.indices.splice(lo..hi, start..=end);
    }

    pub fn remove_range(&mut self, start: usize, end: usize) {
        self.assert_index_valid(start);
        self.assert_index_valid(end);
        assert!(start <= end, "invalid range {start}..={end}");
        let lo = self.indices.partition_point(|&i| i < start);
        let hi = self.indices.partition_point(|&i| i <= end);
        self.indices.drain(lo..hi);
    }

    /// Applies [`add_range`](Self::add_range) to a non-empty [`IndexRange`];
    /// empty ranges are a no-op.
    pub fn add_index_range(&mut self, range: &IndexRange) {
        if let IndexRange::Span { first, last } = *range {
            self.add_range(first, last);
        }
    }

    pub fn remove_index_range(&mut self, range: &IndexRange) {
        if let IndexRange::Span { first, last } = *range {
            self.remove_range(first, last);
        }
    }

    pub fn add_all(&mut self) {
        if self.indices.len() < self.original_set_size {
            self.indices.clear();
            self.indices.extend(1..=self.original_set_size);
        }
    }

    pub fn remove_all(&mut self) {
        self.indices.clear();
    }

    /// Every index of the universe that is not a member.
    #[must_use]
    pub fn complement(&self) -> Self {
        let mut members = self.indices.iter().copied().peekable();
        let indices = (1..=self.original_set_size)
            .filter(|&index| members.next_if_eq(&index).is_none())
            .collect();
        Subset::from_sorted(self.original_set_size, indices)
    }

    /// Maximal runs of consecutive members, in order.
    ///
    /// 示例: `{2, 3, 4, 9, 11, 12}` -> `[2, 4]`, `[9, 9]`, `[11, 12]`
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            rest: &self.indices,
        }
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.assert_same_universe(other);
        if self.indices.is_empty() {
            return other.clone();
        }
        if other.indices.is_empty() {
            return self.clone();
        }
        let mut result = Vec::with_capacity(self.indices.len() + other.indices.len());
        let mut self_it = self.indices.iter().peekable();
        let mut other_it = other.indices.iter().peekable();
        loop {
            // 每次取两边头部较小的那个；相等时两边一起前进
            let next = match (self_it.peek(), other_it.peek()) {
                (Some(&&l), Some(&&r)) if l < r => {
                    self_it.next();
                    l
                }
                (Some(&&l), Some(&&r)) if r < l => {
                    other_it.next();
                    r
                }
                (Some(&&l), Some(_)) => {
                    self_it.next();
                    other_it.next();
                    l
                }
                (Some(&&l), None) => {
                    self_it.next();
                    l
                }
                (None, Some(&&r)) => {
                    other_it.next();
                    r
                }
                (None, None) => break,
            };
            result.push(next);
        }
        Subset::from_sorted(self.original_set_size, result)
    }

    fn union_assign(&mut self, other: &Self) {
        if other.indices.is_empty() {
            self.assert_same_universe(other);
            return;
        }
        *self = self.union(other);
    }

    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.difference_assign(other);
        result
    }

    pub fn difference_assign(&mut self, other: &Self) {
        self.assert_same_universe(other);
        if self.indices.is_empty() || other.indices.is_empty() {
            return;
        }
        let mut other_it = other.indices.iter().copied().peekable();
        self.indices.retain(|&index| {
            while other_it.next_if(|&o| o < index).is_some() {}
            other_it.peek() != Some(&index)
        });
    }

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.assert_same_universe(other);
        let mut other_it = other.indices.iter().copied().peekable();
        let indices = self
            .indices
            .iter()
            .copied()
            .filter(|&index| {
                while other_it.next_if(|&o| o < index).is_some() {}
                other_it.peek() == Some(&index)
            })
            .collect();
        Subset::from_sorted(self.original_set_size, indices)
    }

    /// 从当前成员中无偏地随机抽取 `sample_size` 个不同的下标。
    ///
    /// 每一个大小为 `sample_size` 的成员组合被抽中的概率都相同。
    /// 请求数量超过成员数时返回 [`Error::SampleTooLarge`]。
    pub fn random_sample(&self, rng: &mut KlRand, sample_size: usize) -> Result<Subset> {
        let count = self.indices.len();
        if sample_size > count {
            return Err(Error::SampleTooLarge {
                requested: sample_size,
                available: count,
            });
        }
        if sample_size == count {
            return Ok(self.clone());
        }
        let picked = select(rng, self.indices.iter().copied(), count, sample_size);
        trace!("sampled {sample_size} of {count} members");
        Ok(Subset::from_sorted(self.original_set_size, picked))
    }

    /// Splits off mutually exclusive random samples with the given sizes.
    ///
    /// Equivalent to drawing the first sample uniformly from all members, the
    /// second uniformly from the members left over, and so on. Fails with
    /// [`Error::SampleTooLarge`] when the sizes add up to more than `len()`.
    pub fn random_disjoint_samples(
        &self,
        rng: &mut KlRand,
        sample_sizes: &[usize],
    ) -> Result<Vec<Subset>> {
        let count = self.indices.len();
        let total = sample_sizes
            .iter()
            .try_fold(0usize, |sum, &size| sum.checked_add(size))
            .unwrap_or(usize::MAX);
        if total > count {
            return Err(Error::SampleTooLarge {
                requested: total,
                available: count,
            });
        }

        let mut remaining = sample_sizes.to_vec();
        // left[j]: 还会被提交给第 j 个样本的成员数
        let mut left: Vec<usize> = sample_sizes
            .iter()
            .scan(count, |pool, &size| {
                let here = *pool;
                *pool -= size;
                Some(here)
            })
            .collect();
        let mut picked: Vec<Vec<usize>> = sample_sizes
            .iter()
            .map(|&size| Vec::with_capacity(size))
            .collect();

        let mut outstanding = total;
        for &index in self.indices.iter().rev() {
            if outstanding == 0 {
                break;
            }
            // 成员依次提交给每个样本，被某个样本接受后就不再往后传
            for j in 0..sample_sizes.len() {
                debug_assert!(left[j] > 0);
                let offered = left[j];
                left[j] -= 1;
                if remaining[j] > 0 && rng.uniform_ulong(1, offered as u64) <= remaining[j] as u64
                {
                    picked[j].push(index);
                    remaining[j] -= 1;
                    outstanding -= 1;
                    break;
                }
            }
        }
        debug!(
            "partitioned {count} members into {} disjoint samples ({total} picked)",
            sample_sizes.len()
        );

        Ok(picked
            .into_iter()
            .map(|mut indices| {
                indices.reverse();
                Subset::from_sorted(self.original_set_size, indices)
            })
            .collect())
    }

    /// 在全集 `1..=set_size` 的区间 `first..=set_size` 内随机抽取 `sample_size` 个下标。
    ///
    /// 等价于以 `first..=set_size` 调用 [`random_sample_in_range`](Self::random_sample_in_range)；
    /// `first == set_size + 1` 得到空区间。
    pub fn random_sample_from(
        rng: &mut KlRand,
        set_size: usize,
        sample_size: usize,
        first: usize,
    ) -> Result<Subset> {
        let range = if first == 0 {
            // 0 不是合法下标，交给 random_sample_in_range 报告越界
            IndexRange::EmptyAt(0)
        } else {
            IndexRange::new(first, set_size)
        };
        Subset::random_sample_in_range(rng, set_size, sample_size, range)
    }

    /// 在全集 `1..=set_size` 的区间 `range` 内随机抽取 `sample_size` 个下标。
    ///
    /// 只有 `IndexRange::Nothing` 表示整个全集；`EmptyAt` 是空区间，
    /// 只能抽取 0 个。需要“从某个下标到末尾”时用
    /// [`random_sample_from`](Self::random_sample_from)。
    pub fn random_sample_in_range(
        rng: &mut KlRand,
        set_size: usize,
        sample_size: usize,
        range: IndexRange,
    ) -> Result<Subset> {
        let mut sample = Subset::try_new(set_size)?;
        let out_of_universe = || Error::RangeOutOfUniverse {
            range: range.to_string(),
            size: set_size,
        };
        let (first, last) = match range {
            IndexRange::Nothing => (1, set_size),
            IndexRange::EmptyAt(index) if 1 <= index && index <= set_size + 1 => {
                (index, index - 1)
            }
            IndexRange::EmptyAt(_) => return Err(out_of_universe()),
            IndexRange::Span { first, last } if 1 <= first && last <= set_size => (first, last),
            IndexRange::Span { .. } => return Err(out_of_universe()),
        };
        let range_size = last + 1 - first;
        if sample_size > range_size {
            return Err(Error::SampleTooLarge {
                requested: sample_size,
                available: range_size,
            });
        }
        if sample_size == range_size {
            if range_size > 0 {
                sample.add_range(first, last);
            }
            return Ok(sample);
        }
        sample.indices = select(rng, first..=last, range_size, sample_size);
        trace!("sampled {sample_size} of {range_size} indices from {first}..={last}");
        Ok(sample)
    }
}

/// Selection sampling: walks the pool from the back, keeping each candidate
/// with probability `remaining / left`. Returns the picks in ascending order.
fn select(
    rng: &mut KlRand,
    pool: impl DoubleEndedIterator<Item = usize>,
    pool_len: usize,
    sample_size: usize,
) -> Vec<usize> {
    let mut picked = Vec::with_capacity(sample_size);
    let mut remaining = sample_size;
    for (left, index) in (1..=pool_len).rev().zip(pool.rev()) {
        if remaining == 0 {
            break;
        }
        if rng.uniform_ulong(1, left as u64) <= remaining as u64 {
            picked.push(index);
            remaining -= 1;
        }
    }
    picked.reverse();
    picked
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct SubsetRepr {
    original_set_size: usize,
    members: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<SubsetRepr> for Subset {
    type Error = Error;

    fn try_from(repr: SubsetRepr) -> Result<Self> {
        Subset::try_with_members(repr.original_set_size, repr.members)
    }
}

#[cfg(feature = "serde")]
impl From<Subset> for SubsetRepr {
    fn from(subset: Subset) -> Self {
        SubsetRepr {
            original_set_size: subset.original_set_size,
            members: subset.indices,
        }
    }
}

pub struct Runs<'a> {
    rest: &'a [usize],
}

impl Iterator for Runs<'_> {
    type Item = IndexRange;

    fn next(&mut self) -> Option<Self::Item> {
        let &first = self.rest.first()?;
        let len = self
            .rest
            .iter()
            .enumerate()
            .take_while(|&(offset, &index)| index == first + offset)
            .count();
        self.rest = &self.rest[len..];
        Some(IndexRange::span(first, first + len - 1))
    }
}

impl<'a> IntoIterator for &'a Subset {
    type Item = usize;
    type IntoIter = iter::Copied<slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set_builder = f.debug_set();
        for run in self.runs() {
            set_builder.entry(&run.indices());
        }
        set_builder.finish()?;
        write!(f, " of {}", self.original_set_size)
    }
}

impl AddAssign<&Subset> for Subset {
    #[inline]
    fn add_assign(&mut self, rhs: &Subset) {
        self.union_assign(rhs);
    }
}

impl BitOrAssign<&Subset> for Subset {
    #[inline]
    fn bitor_assign(&mut self, rhs: &Subset) {
        self.union_assign(rhs);
    }
}

impl BitOr<&Subset> for Subset {
    type Output = Subset;
    #[inline]
    fn bitor(self, rhs: &Subset) -> Self::Output {
        self.union(rhs)
    }
}

impl SubAssign<&Subset> for Subset {
    #[inline]
    fn sub_assign(&mut self, rhs: &Subset) {
        self.difference_assign(rhs);
    }
}

impl Sub<&Subset> for Subset {
    type Output = Subset;
    #[inline]
    fn sub(mut self, rhs: &Subset) -> Self::Output {
        self.difference_assign(rhs);
        self
    }
}

impl BitAndAssign<&Subset> for Subset {
    #[inline]
    fn bitand_assign(&mut self, rhs: &Subset) {
        *self = self.intersection(rhs);
    }
}

impl BitAnd<&Subset> for Subset {
    type Output = Subset;
    #[inline]
    fn bitand(self, rhs: &Subset) -> Self::Output {
        self.intersection(rhs)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{Error, IndexRange, KlRand, Subset};

    fn subset(size: usize, members: &[usize]) -> Subset {
        Subset::with_members(size, members.iter().copied())
    }

    fn members(s: &Subset) -> Vec<usize> {
        s.iter().collect()
    }

    #[test]
    fn test_add_keeps_sorted_and_unique() {
        let mut s = Subset::new(10);
        assert!(s.add(7));
        assert!(s.add(2));
        assert!(s.add(9));
        assert!(!s.add(2), "Should not add a member twice");
        assert_eq!(members(&s), vec![2, 7, 9]);
        assert_eq!(s.len(), 3);
        assert!(s.contains(7));
        assert!(!s.contains(8));
        assert!(!s.contains(0));
        assert!(!s.contains(11));
    }

    #[test]
    fn test_remove() {
        let mut s = subset(10, &[2, 7, 9]);
        assert!(s.remove(7));
        assert!(!s.remove(7));
        assert!(!s.remove(42));
        assert_eq!(members(&s), vec![2, 9]);
    }

    #[test]
    #[should_panic]
    fn test_add_zero_panics() {
        Subset::new(10).add(0);
    }

    #[test]
    #[should_panic]
    fn test_add_past_universe_panics() {
        Subset::new(10).add(11);
    }

    #[test]
    #[should_panic]
    fn test_empty_universe_panics() {
        Subset::new(0);
    }

    #[test]
    fn test_try_new_empty_universe() {
        assert!(matches!(Subset::try_new(0), Err(Error::EmptyUniverse)));
        assert!(Subset::try_new(3).is_ok());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_universe_must_fit_header() {
        assert!(Subset::try_new(9_999_999_999).is_ok());
        assert!(matches!(
            Subset::try_new(10_000_000_000),
            Err(Error::UniverseTooLarge {
                size: 10_000_000_000
            })
        ));
        assert!(matches!(
            Subset::try_with_members(usize::MAX, [1]),
            Err(Error::UniverseTooLarge { .. })
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic]
    fn test_new_universe_too_large_panics() {
        Subset::new(10_000_000_000);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic]
    fn test_grow_universe_too_large_panics() {
        Subset::new(4).set_original_set_size(10_000_000_000);
    }

    #[test]
    fn test_try_with_members() {
        let s = Subset::try_with_members(10, [9, 2, 9, 4]).unwrap();
        assert_eq!(members(&s), vec![2, 4, 9]);
        assert!(matches!(
            Subset::try_with_members(10, [3, 11]),
            Err(Error::IndexOutOfUniverse { index: 11, size: 10 })
        ));
        assert!(matches!(
            Subset::try_with_members(10, [0]),
            Err(Error::IndexOutOfUniverse { index: 0, .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let s = subset(12, &[3, 4, 11]);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"original_set_size":12,"members":[3,4,11]}"#);
        assert_eq!(serde_json::from_str::<Subset>(&json).unwrap(), s);
        assert!(
            serde_json::from_str::<Subset>(r#"{"original_set_size":3,"members":[4]}"#).is_err()
        );

        let r = IndexRange::span(2, 5);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(serde_json::from_str::<IndexRange>(&json).unwrap(), r);

        let mut rng = KlRand::new(17);
        rng.uniform_closed_prob();
        let mut restored: KlRand =
            serde_json::from_str(&serde_json::to_string(&rng).unwrap()).unwrap();
        assert_eq!(restored.uniform_long(1, 100), rng.uniform_long(1, 100));
    }

    #[test]
    fn test_add_range_into_empty() {
        let mut s = Subset::new(20);
        s.add_range(5, 8);
        assert_eq!(members(&s), vec![5, 6, 7, 8]);
    }

    #[test]
    fn test_add_range_merges_with_members() {
        let mut s = subset(20, &[1, 6, 7, 15]);
        s.add_range(5, 9);
        assert_eq!(members(&s), vec![1, 5, 6, 7, 8, 9, 15]);
        s.add_range(6, 7);
        assert_eq!(members(&s), vec![1, 5, 6, 7, 8, 9, 15]);
        s.add_range(20, 20);
        assert_eq!(members(&s), vec![1, 5, 6, 7, 8, 9, 15, 20]);
    }

    #[test]
    fn test_remove_range() {
        let mut s = subset(20, &[1, 5, 6, 7, 8, 9, 15]);
        s.remove_range(6, 14);
        assert_eq!(members(&s), vec![1, 5, 15]);
        s.remove_range(2, 4);
        assert_eq!(members(&s), vec![1, 5, 15]);
        s.remove_range(1, 20);
        assert!(s.is_empty());
    }

    #[test]
    fn test_index_range_helpers() {
        let mut s = Subset::new(10);
        s.add_index_range(&IndexRange::span(3, 5));
        s.add_index_range(&IndexRange::empty_at(8));
        s.add_index_range(&IndexRange::NOTHING);
        assert_eq!(members(&s), vec![3, 4, 5]);
        s.remove_index_range(&IndexRange::span(4, 4));
        assert_eq!(members(&s), vec![3, 5]);
    }

    #[test]
    fn test_add_all_remove_all() {
        let mut s = subset(5, &[2]);
        s.add_all();
        assert_eq!(members(&s), vec![1, 2, 3, 4, 5]);
        assert_eq!(s, Subset::full(5));
        s.remove_all();
        assert!(s.is_empty());
        assert_eq!(s.original_set_size(), 5);
    }

    #[test]
    fn test_complement() {
        let s = subset(8, &[1, 3, 4, 8]);
        let c = s.complement();
        assert_eq!(members(&c), vec![2, 5, 6, 7]);
        assert_eq!(c.complement(), s);
        assert_eq!(Subset::new(3).complement(), Subset::full(3));
        assert!(Subset::full(3).complement().is_empty());
    }

    #[test]
    fn test_union() {
        let mut a = subset(20, &[1, 4, 9, 12]);
        let b = subset(20, &[2, 4, 10, 12, 20]);
        assert_eq!(members(&a.union(&b)), vec![1, 2, 4, 9, 10, 12, 20]);
        assert_eq!(a.union(&b), b.union(&a));
        a += &b;
        assert_eq!(members(&a), vec![1, 2, 4, 9, 10, 12, 20]);

        let mut empty = Subset::new(20);
        empty |= &b;
        assert_eq!(empty, b);
        assert_eq!(b.clone() | &Subset::new(20), b);
    }

    #[test]
    fn test_difference() {
        let a = subset(20, &[1, 4, 9, 12, 15]);
        let b = subset(20, &[2, 4, 10, 12, 20]);
        assert_eq!(members(&a.difference(&b)), vec![1, 9, 15]);
        assert_eq!(members(&(b.clone() - &a)), vec![2, 10, 20]);
        let mut c = a.clone();
        c -= &Subset::new(20);
        assert_eq!(c, a);
        c -= &a;
        assert!(c.is_empty());
    }

    #[test]
    fn test_intersection() {
        let a = subset(20, &[1, 4, 9, 12, 15]);
        let b = subset(20, &[2, 4, 10, 12, 20]);
        assert_eq!(members(&a.intersection(&b)), vec![4, 12]);
        assert_eq!(a.clone() & &b, b.clone() & &a);
        let mut c = a.clone();
        c &= &a.complement();
        assert!(c.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_union_of_different_universes_panics() {
        let _ = subset(10, &[1]).union(&subset(11, &[2]));
    }

    #[test]
    fn test_set_original_set_size() {
        let mut s = subset(10, &[2, 6]);
        s.set_original_set_size(6);
        assert_eq!(s.original_set_size(), 6);
        assert_eq!(members(&s), vec![2, 6]);
        s.set_original_set_size(100);
        assert_eq!(members(&s.complement()).len(), 98);
    }

    #[test]
    #[should_panic]
    fn test_shrinking_universe_below_members_panics() {
        subset(10, &[2, 6]).set_original_set_size(5);
    }

    #[test]
    fn test_runs() {
        let s = subset(20, &[2, 3, 4, 9, 11, 12]);
        let runs: Vec<_> = s.runs().collect();
        assert_eq!(
            runs,
            vec![
                IndexRange::span(2, 4),
                IndexRange::span(9, 9),
                IndexRange::span(11, 12)
            ]
        );
        assert_eq!(Subset::new(4).runs().count(), 0);
        assert_eq!(format!("{s:?}"), "{2..=4, 9..=9, 11..=12} of 20");
    }

    #[test]
    fn test_sample_size_contract() {
        let mut rng = KlRand::new(1);
        let s = subset(10, &[1, 3, 5, 7]);
        assert!(matches!(
            s.random_sample(&mut rng, 5),
            Err(Error::SampleTooLarge {
                requested: 5,
                available: 4
            })
        ));
        assert_eq!(s.random_sample(&mut rng, 4).unwrap(), s);
        let empty = s.random_sample(&mut rng, 0).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.original_set_size(), 10);
    }

    #[test]
    fn test_sample_is_drawn_from_members() {
        let mut rng = KlRand::new(77);
        let s = subset(50, &[3, 8, 13, 21, 34, 45]);
        for _ in 0..500 {
            let sample = s.random_sample(&mut rng, 3).unwrap();
            assert_eq!(sample.len(), 3);
            assert_eq!(sample.original_set_size(), 50);
            assert!(sample.iter().all(|i| s.contains(i)));
            assert!(sample.as_slice().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_sample_single_uniform() {
        const TRIALS: usize = 20_000;
        let mut rng = KlRand::new(4242);
        let s = Subset::full(10);
        let mut hits = [0usize; 10];
        for _ in 0..TRIALS {
            let sample = s.random_sample(&mut rng, 1).unwrap();
            hits[sample.first().unwrap() - 1] += 1;
        }
        for (i, &h) in hits.iter().enumerate() {
            let freq = h as f64 / TRIALS as f64;
            assert!((freq - 0.1).abs() < 0.01, "index {} freq {freq}", i + 1);
        }
    }

    #[test]
    fn test_sample_combinations_uniform() {
        // 4 选 2 共 6 种组合，每种的频率应接近 1/6
        const TRIALS: usize = 30_000;
        let mut rng = KlRand::new(-99);
        let s = subset(9, &[2, 4, 6, 8]);
        let mut hits: HashMap<Vec<usize>, usize> = HashMap::new();
        for _ in 0..TRIALS {
            let sample = s.random_sample(&mut rng, 2).unwrap();
            *hits.entry(members(&sample)).or_default() += 1;
        }
        assert_eq!(hits.len(), 6);
        for (combo, &h) in &hits {
            let freq = h as f64 / TRIALS as f64;
            assert!((freq - 1.0 / 6.0).abs() < 0.015, "{combo:?} freq {freq}");
        }
    }

    #[test]
    fn test_same_seed_same_sample() {
        let s = Subset::full(100);
        let a = s.random_sample(&mut KlRand::new(5), 17).unwrap();
        let b = s.random_sample(&mut KlRand::new(5), 17).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_disjoint_samples_too_large() {
        let mut rng = KlRand::new(3);
        let s = subset(10, &[1, 2, 3]);
        assert!(matches!(
            s.random_disjoint_samples(&mut rng, &[2, 2]),
            Err(Error::SampleTooLarge {
                requested: 4,
                available: 3
            })
        ));
        assert!(s.random_disjoint_samples(&mut rng, &[usize::MAX, 2]).is_err());
        assert!(s.random_disjoint_samples(&mut rng, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_disjoint_samples_exhaustive() {
        let mut rng = KlRand::new(8);
        let s = subset(30, &[1, 4, 5, 9, 10, 11, 17, 22, 23, 29]);
        for _ in 0..200 {
            let samples = s.random_disjoint_samples(&mut rng, &[4, 0, 1, 5]).unwrap();
            assert_eq!(samples.len(), 4);
            for (sample, size) in samples.iter().zip([4, 0, 1, 5]) {
                assert_eq!(sample.len(), size);
            }
            let mut union = Subset::new(30);
            for (i, a) in samples.iter().enumerate() {
                for b in &samples[i + 1..] {
                    assert!(a.intersection(b).is_empty());
                }
                union += a;
            }
            assert_eq!(union, s);
        }
    }

    #[test]
    fn test_disjoint_samples_partial() {
        let mut rng = KlRand::new(12);
        let s = Subset::full(40);
        let samples = s.random_disjoint_samples(&mut rng, &[5, 7]).unwrap();
        assert_eq!(samples[0].len(), 5);
        assert_eq!(samples[1].len(), 7);
        assert!(samples[0].intersection(&samples[1]).is_empty());
    }

    #[test]
    fn test_disjoint_samples_sequential_conditioning() {
        // 5 个成员，样本大小 [2, 1]：每个成员落入第一个样本的概率为 2/5，
        // 落入第二个样本的概率为 (3/5)·(1/3) = 1/5，与成员位置无关。
        const TRIALS: usize = 30_000;
        let mut rng = KlRand::new(2718);
        let s = subset(12, &[2, 3, 5, 7, 11]);
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for _ in 0..TRIALS {
            let samples = s.random_disjoint_samples(&mut rng, &[2, 1]).unwrap();
            for i in &samples[0] {
                *first.entry(i).or_insert(0usize) += 1;
            }
            for i in &samples[1] {
                *second.entry(i).or_insert(0usize) += 1;
            }
        }
        for i in &s {
            let p_first = first[&i] as f64 / TRIALS as f64;
            let p_second = second[&i] as f64 / TRIALS as f64;
            assert!((p_first - 0.4).abs() < 0.02, "{i}: {p_first}");
            assert!((p_second - 0.2).abs() < 0.02, "{i}: {p_second}");
        }
    }

    #[test]
    fn test_even_members_split_three_ways() {
        let mut s = Subset::new(20);
        for i in (2..=20).step_by(2) {
            s.add(i);
        }
        assert_eq!(s.len(), 10);

        let mut rng = KlRand::new(20);
        let samples = s.random_disjoint_samples(&mut rng, &[3, 3, 4]).unwrap();
        assert_eq!(
            samples.iter().map(Subset::len).collect::<Vec<_>>(),
            vec![3, 3, 4]
        );
        let mut union = Subset::new(20);
        for (i, a) in samples.iter().enumerate() {
            assert_eq!(a.original_set_size(), 20);
            for b in &samples[i + 1..] {
                assert!(a.intersection(b).is_empty());
            }
            union += a;
        }
        assert_eq!(members(&union), (2..=20).step_by(2).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_in_range() {
        let mut rng = KlRand::new(6);
        for _ in 0..200 {
            let sample =
                Subset::random_sample_in_range(&mut rng, 50, 4, IndexRange::span(10, 19)).unwrap();
            assert_eq!(sample.len(), 4);
            assert!(sample.iter().all(|i| (10..=19).contains(&i)));
        }
        let whole = Subset::random_sample_in_range(&mut rng, 6, 6, IndexRange::NOTHING).unwrap();
        assert_eq!(whole, Subset::full(6));
        let all = Subset::random_sample_in_range(&mut rng, 9, 3, IndexRange::span(4, 6)).unwrap();
        assert_eq!(members(&all), vec![4, 5, 6]);
        let none =
            Subset::random_sample_in_range(&mut rng, 9, 0, IndexRange::empty_at(10)).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_sample_from_runs_to_end_of_universe() {
        let mut rng = KlRand::new(31);
        for _ in 0..200 {
            let sample = Subset::random_sample_from(&mut rng, 12, 3, 5).unwrap();
            assert_eq!(sample.len(), 3);
            assert!(sample.iter().all(|i| (5..=12).contains(&i)));
        }
        let tail = Subset::random_sample_from(&mut rng, 12, 1, 12).unwrap();
        assert_eq!(members(&tail), vec![12]);
        let all = Subset::random_sample_from(&mut rng, 12, 12, 1).unwrap();
        assert_eq!(all, Subset::full(12));
        assert!(Subset::random_sample_from(&mut rng, 12, 0, 13).unwrap().is_empty());

        // 旧的 (first, 0) 写法解码为空区间，而不是“到末尾”
        let legacy = IndexRange::new(5, 0);
        assert!(matches!(
            Subset::random_sample_in_range(&mut rng, 12, 3, legacy),
            Err(Error::SampleTooLarge {
                requested: 3,
                available: 0
            })
        ));
    }

    #[test]
    fn test_sample_from_errors() {
        let mut rng = KlRand::new(31);
        assert!(matches!(
            Subset::random_sample_from(&mut rng, 12, 1, 14),
            Err(Error::RangeOutOfUniverse { size: 12, .. })
        ));
        assert!(matches!(
            Subset::random_sample_from(&mut rng, 12, 1, 0),
            Err(Error::RangeOutOfUniverse { .. })
        ));
        assert!(matches!(
            Subset::random_sample_from(&mut rng, 12, 9, 5),
            Err(Error::SampleTooLarge {
                requested: 9,
                available: 8
            })
        ));
    }

    #[test]
    fn test_sample_in_range_errors() {
        let mut rng = KlRand::new(6);
        assert!(matches!(
            Subset::random_sample_in_range(&mut rng, 9, 4, IndexRange::span(4, 6)),
            Err(Error::SampleTooLarge { .. })
        ));
        assert!(matches!(
            Subset::random_sample_in_range(&mut rng, 9, 1, IndexRange::span(4, 10)),
            Err(Error::RangeOutOfUniverse { size: 9, .. })
        ));
        assert!(matches!(
            Subset::random_sample_in_range(&mut rng, 9, 0, IndexRange::empty_at(11)),
            Err(Error::RangeOutOfUniverse { .. })
        ));
        assert!(matches!(
            Subset::random_sample_in_range(&mut rng, 0, 0, IndexRange::NOTHING),
            Err(Error::EmptyUniverse)
        ));
    }
}
