//! Generic keyed fold
//!
//! [`aggregate_by_key`] groups rows by a key function and runs a set of named
//! reducers over each group in one pass. Groups keep first-seen order. All
//! accumulators are integers; callers derive ratios after the fold.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

type Extract<'a, R> = Box<dyn Fn(&R) -> i64 + 'a>;
type Identify<'a, R> = Box<dyn Fn(&R) -> String + 'a>;

/// A named reduction over the rows of one group
pub enum Reducer<'a, R> {
    Sum(&'static str, Extract<'a, R>),
    Count(&'static str),
    Min(&'static str, Extract<'a, R>),
    Max(&'static str, Extract<'a, R>),
    CountDistinct(&'static str, Identify<'a, R>),
}

impl<'a, R> Reducer<'a, R> {
    pub fn sum(name: &'static str, f: impl Fn(&R) -> i64 + 'a) -> Self {
        Reducer::Sum(name, Box::new(f))
    }

    pub fn count(name: &'static str) -> Self {
        Reducer::Count(name)
    }

    pub fn min(name: &'static str, f: impl Fn(&R) -> i64 + 'a) -> Self {
        Reducer::Min(name, Box::new(f))
    }

    pub fn max(name: &'static str, f: impl Fn(&R) -> i64 + 'a) -> Self {
        Reducer::Max(name, Box::new(f))
    }

    pub fn count_distinct(name: &'static str, f: impl Fn(&R) -> String + 'a) -> Self {
        Reducer::CountDistinct(name, Box::new(f))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reducer::Sum(n, _)
            | Reducer::Count(n)
            | Reducer::Min(n, _)
            | Reducer::Max(n, _)
            | Reducer::CountDistinct(n, _) => n,
        }
    }

    fn start(&self) -> Accumulator {
        match self {
            Reducer::Sum(..) => Accumulator::Sum(0),
            Reducer::Count(_) => Accumulator::Count(0),
            Reducer::Min(..) => Accumulator::Min(None),
            Reducer::Max(..) => Accumulator::Max(None),
            Reducer::CountDistinct(..) => Accumulator::Distinct(HashSet::new()),
        }
    }

    fn apply(&self, acc: &mut Accumulator, row: &R) {
        match (self, acc) {
            (Reducer::Sum(_, f), Accumulator::Sum(total)) => *total += f(row),
            (Reducer::Count(_), Accumulator::Count(n)) => *n += 1,
            (Reducer::Min(_, f), Accumulator::Min(current)) => {
                let v = f(row);
                *current = Some(current.map_or(v, |c| c.min(v)));
            }
            (Reducer::Max(_, f), Accumulator::Max(current)) => {
                let v = f(row);
                *current = Some(current.map_or(v, |c| c.max(v)));
            }
            (Reducer::CountDistinct(_, f), Accumulator::Distinct(seen)) => {
                seen.insert(f(row));
            }
            _ => unreachable!("accumulator created by the same reducer"),
        }
    }
}

enum Accumulator {
    Sum(i64),
    Count(i64),
    Min(Option<i64>),
    Max(Option<i64>),
    Distinct(HashSet<String>),
}

impl Accumulator {
    fn finish(self) -> i64 {
        match self {
            Accumulator::Sum(v) | Accumulator::Count(v) => v,
            Accumulator::Min(v) | Accumulator::Max(v) => v.unwrap_or(0),
            Accumulator::Distinct(seen) => seen.len() as i64,
        }
    }
}

/// Reduced values of one group, in reducer order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metrics {
    values: Vec<(&'static str, i64)>,
}

impl Metrics {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }

    /// Value of a reducer that is known to exist, zero otherwise
    pub fn value(&self, name: &str) -> i64 {
        self.get(name).unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.values.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K> {
    pub key: K,
    pub metrics: Metrics,
}

/// Mapping from group key to reduced values, in first-seen key order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedMetrics<K: Eq + Hash> {
    groups: Vec<Group<K>>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash> Default for GroupedMetrics<K> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> GroupedMetrics<K> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&Metrics> {
        self.index.get(key).map(|&i| &self.groups[i].metrics)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group<K>> {
        self.groups.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.iter().map(|g| &g.key)
    }

    /// Sum of one reducer across all groups
    pub fn total(&self, name: &str) -> i64 {
        self.groups.iter().map(|g| g.metrics.value(name)).sum()
    }

    pub fn into_groups(self) -> Vec<Group<K>> {
        self.groups
    }
}

/// Fold rows into per-key reduced values
///
/// Rows are only borrowed, so repeated calls on the same input give identical
/// output. An empty input yields an empty mapping.
pub fn aggregate_by_key<'r, R, K, I, F>(
    rows: I,
    key_fn: F,
    reducers: &[Reducer<'_, R>],
) -> GroupedMetrics<K>
where
    R: 'r,
    I: IntoIterator<Item = &'r R>,
    K: Eq + Hash + Clone,
    F: Fn(&R) -> K,
{
    let mut order: Vec<K> = Vec::new();
    let mut accumulators: HashMap<K, Vec<Accumulator>> = HashMap::new();

    for row in rows {
        let key = key_fn(row);
        let accs = accumulators.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            reducers.iter().map(Reducer::start).collect()
        });
        for (reducer, acc) in reducers.iter().zip(accs.iter_mut()) {
            reducer.apply(acc, row);
        }
    }

    let mut result = GroupedMetrics::default();
    for key in order {
        let Some(accs) = accumulators.remove(&key) else {
            continue;
        };
        let values = reducers
            .iter()
            .zip(accs)
            .map(|(r, acc)| (r.name(), acc.finish()))
            .collect();
        result.index.insert(key.clone(), result.groups.len());
        result.groups.push(Group {
            key,
            metrics: Metrics { values },
        });
    }
    result
}
