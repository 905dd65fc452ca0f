//! Generational slot arena.
//!
//! Problems and graphs live in arenas owned by a [`Model`](crate::Model). Nodes refer back to them
//! through typed keys instead of pointers, so a back-reference never keeps its target alive. A key
//! whose slot was freed (or freed and reused) no longer resolves.

use std::fmt;
use std::marker::PhantomData;

/// Raw slot address: index plus the generation the slot had when the key was issued.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotKey {
    index: u32,
    generation: u32,
}

impl SlotKey {
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

pub trait ArenaKey: Copy {
    const KIND: &'static str;

    fn from_slot(key: SlotKey) -> Self;
    fn slot(self) -> SlotKey;
}

macro_rules! arena_key {
    ($(#[$meta:meta])* $Key:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $Key(SlotKey);

        impl ArenaKey for $Key {
            const KIND: &'static str = $kind;

            #[inline]
            fn from_slot(key: SlotKey) -> Self {
                Self(key)
            }

            #[inline]
            fn slot(self) -> SlotKey {
                self.0
            }
        }

        impl fmt::Display for $Key {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

arena_key!(
    /// Arena address of a [`Problem`](crate::Problem).
    ProblemId,
    "problem"
);
arena_key!(
    /// Arena address of a [`Graph`](crate::Graph).
    GraphId,
    "graph"
);

#[derive(Debug)]
enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

#[derive(Debug)]
pub struct Arena<K: ArenaKey, T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
    _key: PhantomData<K>,
}

impl<K: ArenaKey, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            _key: PhantomData,
        }
    }
}

impl<K: ArenaKey, T> Arena<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a value built from its own key.
    pub fn insert_with(&mut self, make: impl FnOnce(K) -> T) -> K {
        let (index, generation) = match self.free_head {
            Some(index) => {
                let Slot::Vacant { generation, next_free } = self.slots[index as usize] else {
                    unreachable!("free list points at an occupied slot");
                };
                self.free_head = next_free;
                (index, generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).expect("arena exceeds u32::MAX slots");
                self.slots.push(Slot::Vacant {
                    generation: 0,
                    next_free: None,
                });
                (index, 0)
            }
        };
        let key = K::from_slot(SlotKey { index, generation });
        self.slots[index as usize] = Slot::Occupied {
            generation,
            value: make(key),
        };
        self.len += 1;
        key
    }

    pub fn insert(&mut self, value: T) -> K {
        self.insert_with(|_| value)
    }

    pub fn get(&self, key: K) -> Option<&T> {
        let key = key.slot();
        match self.slots.get(key.index as usize)? {
            Slot::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        let key = key.slot();
        match self.slots.get_mut(key.index as usize)? {
            Slot::Occupied { generation, value } if *generation == key.generation => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    /// Free the slot. Every outstanding copy of `key` stops resolving.
    pub fn remove(&mut self, key: K) -> Option<T> {
        let raw = key.slot();
        if !self.contains(key) {
            return None;
        }
        let vacant = Slot::Vacant {
            generation: raw.generation.wrapping_add(1),
            next_free: self.free_head,
        };
        let Slot::Occupied { value, .. } = std::mem::replace(&mut self.slots[raw.index as usize], vacant) else {
            unreachable!("contains() checked occupancy");
        };
        self.free_head = Some(raw.index);
        self.len -= 1;
        Some(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied { generation, value } => Some((
                K::from_slot(SlotKey {
                    index: index as u32,
                    generation: *generation,
                }),
                value,
            )),
            Slot::Vacant { .. } => None,
        })
    }
}
