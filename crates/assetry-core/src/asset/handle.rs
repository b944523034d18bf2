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
use std::{any::Any, fmt, ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a decoded resource of type `T`.
///
/// Cloning a handle is cheap: it only increments the reference count and does
/// not duplicate the underlying data. The resource is deallocated when the
/// last handle (typed or type-erased) is dropped.
#[derive(Debug)]
pub struct AssetHandle<T: Asset>(Arc<T>);

impl<T: Asset> AssetHandle<T> {
    /// Creates a new `AssetHandle` that takes ownership of the resource.
    pub fn new(asset: T) -> Self {
        Self(Arc::new(asset))
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Asset> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Asset> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A type-erased handle to a decoded resource.
///
/// Descriptors store their resources behind this handle because the registry
/// is uniform over every asset type. Consumers recover the concrete type with
/// [`ResourceHandle::downcast`].
#[derive(Clone)]
pub struct ResourceHandle(Arc<dyn Any + Send + Sync>);

impl ResourceHandle {
    /// Wraps a decoded resource.
    pub fn new<T: Asset>(resource: T) -> Self {
        Self(Arc::new(resource))
    }

    /// Returns a typed handle if the resource is a `T`.
    pub fn downcast<T: Asset>(&self) -> Option<AssetHandle<T>> {
        self.0.clone().downcast::<T>().ok().map(AssetHandle)
    }

    /// Borrows the resource as a `T`, if it is one.
    pub fn downcast_ref<T: Asset>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns `true` if the resource is a `T`.
    pub fn is<T: Asset>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Asset> From<AssetHandle<T>> for ResourceHandle {
    fn from(handle: AssetHandle<T>) -> Self {
        Self(handle.0)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResourceHandle(..)")
    }
}

/// The decoded output of a load.
///
/// Whether an asset type produces one resource or several is part of that
/// type's loader contract, so the loader states it explicitly instead of the
/// registry guessing from the value's shape.
#[derive(Debug, Clone)]
pub enum ResourcePayload {
    /// The type decodes to exactly one resource.
    Single(ResourceHandle),
    /// The type decodes to an ordered set of resources (e.g. cube faces).
    Multiple(Vec<ResourceHandle>),
}

impl ResourcePayload {
    /// Convenience constructor for a single resource.
    pub fn single<T: Asset>(resource: T) -> Self {
        Self::Single(ResourceHandle::new(resource))
    }

    /// The primary resource: the only one, or the first of several.
    pub fn primary(&self) -> Option<&ResourceHandle> {
        self.as_slice().first()
    }

    /// All resources as a slice.
    pub fn as_slice(&self) -> &[ResourceHandle] {
        match self {
            Self::Single(handle) => std::slice::from_ref(handle),
            Self::Multiple(handles) => handles,
        }
    }

    /// Number of resources carried.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Returns `true` for an empty `Multiple` payload.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}
