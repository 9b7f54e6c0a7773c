// Copyright 2025 eraflo
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

use super::Asset;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed, generation-checked reference to a cache-owned resource.
///
/// A handle is two integers: the slot the resource was reserved in and the
/// generation of the cache that issued it. It owns nothing, is `Copy`, and can
/// be held across frames; resolving it goes through the cache, which answers
/// "not found" once the handle's generation falls below the cache's
/// validation floor.
///
/// Generation `0` is never issued, so [`ResourceHandle::NULL`] never resolves.
pub struct ResourceHandle<T: Asset> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Asset> ResourceHandle<T> {
    /// A handle that never resolves.
    pub const NULL: Self = Self::new(0, 0);

    /// Creates a handle from raw parts.
    ///
    /// This is normally only called by a resource cache.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// The slot index the resource was reserved in.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// The generation of the cache that issued the handle.
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns `true` for the null handle.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.generation == 0
    }
}

impl<T: Asset> Clone for ResourceHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Asset> Copy for ResourceHandle<T> {}

impl<T: Asset> PartialEq for ResourceHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T: Asset> Eq for ResourceHandle<T> {}

impl<T: Asset> Hash for ResourceHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T: Asset> fmt::Debug for ResourceHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T: Asset> Default for ResourceHandle<T> {
    fn default() -> Self {
        Self::NULL
    }
}
