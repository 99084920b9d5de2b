// Copyright 2025 Maildex Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashSet;
use std::hash::Hash;

/// Unordered set of comparable elements.
#[derive(Debug, Clone, Default)]
pub struct Set<T: Eq + Hash> {
    elems: HashSet<T>,
}

impl<T: Eq + Hash> Set<T> {
    pub fn new() -> Self {
        Set {
            elems: HashSet::new(),
        }
    }

    pub fn insert(&mut self, item: T) {
        self.elems.insert(item);
    }

    pub fn remove(&mut self, item: &T) {
        self.elems.remove(item);
    }

    pub fn has(&self, item: &T) -> bool {
        self.elems.contains(item)
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elems.iter()
    }
}

impl<T: Eq + Hash + Clone> Set<T> {
    /// Elements in `self` or `other`.
    pub fn union(&self, other: &Set<T>) -> Set<T> {
        Set {
            elems: self.elems.union(&other.elems).cloned().collect(),
        }
    }

    /// Elements in both `self` and `other`.
    pub fn intersect(&self, other: &Set<T>) -> Set<T> {
        Set {
            elems: self.elems.intersection(&other.elems).cloned().collect(),
        }
    }

    /// Elements in `self` but not `other`.
    pub fn difference(&self, other: &Set<T>) -> Set<T> {
        Set {
            elems: self.elems.difference(&other.elems).cloned().collect(),
        }
    }
}

impl<T: Eq + Hash> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Set {
            elems: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_operations() {
        let mut s = Set::new();
        assert!(!s.has(&1));
        s.insert(1);
        assert!(s.has(&1));
        assert!(!s.has(&2));

        s.insert(1);
        s.insert(1);
        assert_eq!(s.len(), 1);

        s.remove(&1);
        assert!(!s.has(&1));
        s.remove(&2); // no-op
        assert!(s.is_empty());
    }

    #[test]
    fn iterates_all_elements() {
        let s: Set<i32> = [1, 2, 3, 4, 5].into_iter().collect();
        let mut got: Vec<i32> = s.iter().copied().collect();
        got.sort();
        assert_eq!(got, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn union_intersect_difference() {
        let a: Set<i32> = [1, 2, 3].into_iter().collect();
        let b: Set<i32> = [2, 3, 4].into_iter().collect();

        let mut u: Vec<i32> = a.union(&b).iter().copied().collect();
        u.sort();
        assert_eq!(u, vec![1, 2, 3, 4]);

        let mut i: Vec<i32> = a.intersect(&b).iter().copied().collect();
        i.sort();
        assert_eq!(i, vec![2, 3]);

        let mut d: Vec<i32> = a.difference(&b).iter().copied().collect();
        d.sort();
        assert_eq!(d, vec![1]);
    }

    #[test]
    fn intersect_with_empty_is_empty() {
        let a: Set<i32> = [1, 2].into_iter().collect();
        let empty = Set::new();
        assert!(a.intersect(&empty).is_empty());
        assert_eq!(a.union(&empty).len(), 2);
    }
}
