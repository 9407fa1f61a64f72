//! Typed, 1-based indices into append-only collections.
//!
//! Every entity kind of the vector map gets its own id type, so a lane id can
//! never be handed to something that expects a node id. Ids are positional:
//! the n-th element pushed into an [`IdVec`] gets id `n`, and id `0` is
//! reserved for "no link" in serialized output.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

pub trait TypedId: Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug {
    fn from_index(index: u64) -> Self;
    fn index(self) -> u64;

    fn from_position(position: usize) -> Self {
        Self::from_index(position as u64 + 1)
    }

    fn position(self) -> usize {
        (self.index() - 1) as usize
    }
}

/// Raised when an id is read back as `0`, which only links may hold.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ids are 1-based, got 0")]
pub struct ZeroId;

/// Declares a 1-based newtype id implementing [`TypedId`].
#[macro_export]
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(try_from = "u64", into = "u64")]
        pub struct $name(u64);

        impl ::std::convert::TryFrom<u64> for $name {
            type Error = $crate::ZeroId;

            fn try_from(index: u64) -> Result<Self, Self::Error> {
                if index == 0 {
                    Err($crate::ZeroId)
                } else {
                    Ok(Self(index))
                }
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl $crate::TypedId for $name {
            fn from_index(index: u64) -> Self {
                assert!(index > 0, "ids are 1-based");
                Self(index)
            }

            fn index(self) -> u64 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Implements equality and ordering for a struct by comparing a single id field.
#[macro_export]
macro_rules! id_cmp {
    ($name:ty, $field:ident) => {
        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.$field == other.$field
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<::std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                self.$field.cmp(&other.$field)
            }
        }
    };
}

/// Serializes an optional link as its raw index, with `None` written as `0`.
pub mod zero_none {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::TypedId;

    pub fn serialize<S, I>(value: &Option<I>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        I: TypedId,
    {
        serializer.serialize_u64(value.map_or(0, TypedId::index))
    }

    pub fn deserialize<'de, D, I>(deserializer: D) -> Result<Option<I>, D::Error>
    where
        D: Deserializer<'de>,
        I: TypedId,
    {
        let raw = u64::deserialize(deserializer)?;
        Ok(if raw == 0 {
            None
        } else {
            Some(I::from_index(raw))
        })
    }
}

/// Append-only vector addressed by a typed 1-based id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdVec<I, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I, T> Default for IdVec<I, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<I: TypedId, T> IdVec<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) -> I {
        self.items.push(item);
        I::from_position(self.items.len() - 1)
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(id.position())
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.items.get_mut(id.position())
    }

    pub fn contains(&self, id: I) -> bool {
        id.position() < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len()).map(I::from_position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(position, item)| (I::from_position(position), item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(position, item)| (I::from_position(position), item))
    }

    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /**
     * Drops every item for which `keep` returns false and renumbers the
     * survivors densely, preserving their relative order.
     *
     * Returns the old-id to new-id mapping (indexed by old position), with
     * `None` for dropped items. Callers are responsible for rewriting every
     * reference into this collection with it.
     */
    pub fn compact<F>(&mut self, mut keep: F) -> Remap<I>
    where
        F: FnMut(I, &T) -> bool,
    {
        let mut mapping = Vec::with_capacity(self.items.len());
        let mut next = 0;
        let old = std::mem::take(&mut self.items);
        for (position, item) in old.into_iter().enumerate() {
            if keep(I::from_position(position), &item) {
                mapping.push(Some(I::from_position(next)));
                self.items.push(item);
                next += 1;
            } else {
                mapping.push(None);
            }
        }
        Remap { mapping }
    }
}

impl<I: TypedId, T> std::ops::Index<I> for IdVec<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.items[id.position()]
    }
}

impl<I: TypedId, T> std::ops::IndexMut<I> for IdVec<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.position()]
    }
}

/// Old-id to new-id mapping produced by [`IdVec::compact`].
#[derive(Debug, Clone)]
pub struct Remap<I> {
    mapping: Vec<Option<I>>,
}

impl<I: TypedId> Remap<I> {
    /// The new id of `id`, or `None` if it was dropped.
    pub fn apply(&self, id: I) -> Option<I> {
        self.mapping.get(id.position()).copied().flatten()
    }

    pub fn dropped(&self) -> usize {
        self.mapping.iter().filter(|entry| entry.is_none()).count()
    }
}

#[cfg(test)]
mod typed_id_tests {
    use crate::*;

    typed_id!(
        /// test id
        ThingId
    );

    #[test]
    fn one_based() {
        let mut things: IdVec<ThingId, &str> = IdVec::new();
        let a = things.push("a");
        let b = things.push("b");
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(things[b], "b");
        assert_eq!(things.get(b), Some(&"b"));
        assert!(!things.contains(ThingId::from_index(3)));
    }

    #[test]
    fn zero_is_not_an_id() {
        assert_eq!(serde_json::from_str::<ThingId>("3").unwrap(), ThingId::from_index(3));
        assert_eq!(serde_json::to_string(&ThingId::from_index(3)).unwrap(), "3");
        let error = serde_json::from_str::<ThingId>("0").unwrap_err();
        assert!(error.to_string().contains("1-based"), "{}", error);
    }

    #[test]
    fn compact() {
        let mut things: IdVec<ThingId, u32> = IdVec::new();
        for value in 0..5 {
            things.push(value);
        }
        let remap = things.compact(|_, value| value % 2 == 0);
        assert_eq!(things.values().copied().collect::<Vec<_>>(), vec![0, 2, 4]);
        assert_eq!(remap.apply(ThingId::from_index(1)), Some(ThingId::from_index(1)));
        assert_eq!(remap.apply(ThingId::from_index(2)), None);
        assert_eq!(remap.apply(ThingId::from_index(5)), Some(ThingId::from_index(3)));
        assert_eq!(remap.dropped(), 2);
    }
}
