//! Pooled scratch collections for asset searches.

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasher, Hash};
use std::ops::{Deref, DerefMut};

use cohost_snapshot::{AssetValue, Checksum};
use parking_lot::Mutex;

use crate::config::PoolConfig;

/// A collection that can be cleared and reused.
pub trait Recycle: Default {
	/// Empties the collection, keeping its allocation.
	fn recycle(&mut self);

	/// Allocated capacity, used to decide whether reuse is worthwhile.
	fn retained_len(&self) -> usize;
}

impl<K, S> Recycle for HashSet<K, S>
where
	K: Eq + Hash,
	S: BuildHasher + Default,
{
	fn recycle(&mut self) {
		self.clear();
	}

	fn retained_len(&self) -> usize {
		self.capacity()
	}
}

impl<K, V, S> Recycle for HashMap<K, V, S>
where
	K: Eq + Hash,
	S: BuildHasher + Default,
{
	fn recycle(&mut self) {
		self.clear();
	}

	fn retained_len(&self) -> usize {
		self.capacity()
	}
}

/// Bounded free list of reusable collections.
#[derive(Debug)]
pub struct Pool<T> {
	idle: Mutex<Vec<T>>,
	capacity: usize,
	max_retained_len: usize,
}

impl<T: Recycle> Pool<T> {
	/// Creates an empty pool.
	pub fn new(config: &PoolConfig) -> Self {
		Self {
			idle: Mutex::new(Vec::new()),
			capacity: config.capacity,
			max_retained_len: config.max_retained_len,
		}
	}

	/// Takes an empty collection from the pool, allocating if none is idle.
	pub fn get(&self) -> Pooled<'_, T> {
		let item = self.idle.lock().pop().unwrap_or_default();
		Pooled { pool: self, item }
	}

	/// Number of idle collections.
	pub fn idle(&self) -> usize {
		self.idle.lock().len()
	}

	fn put(&self, mut item: T) {
		if item.retained_len() > self.max_retained_len {
			return;
		}
		item.recycle();
		let mut idle = self.idle.lock();
		if idle.len() < self.capacity {
			idle.push(item);
		}
	}
}

/// RAII guard returning a collection to its [`Pool`] on drop.
pub struct Pooled<'a, T: Recycle> {
	pool: &'a Pool<T>,
	item: T,
}

impl<T: Recycle> Deref for Pooled<'_, T> {
	type Target = T;

	fn deref(&self) -> &T {
		&self.item
	}
}

impl<T: Recycle> DerefMut for Pooled<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		&mut self.item
	}
}

impl<T: Recycle> Drop for Pooled<'_, T> {
	fn drop(&mut self) {
		self.pool.put(std::mem::take(&mut self.item));
	}
}

/// Pools shared by every scope of one storage.
#[derive(Debug)]
pub(crate) struct AssetPools {
	pub(crate) checksum_sets: Pool<HashSet<Checksum>>,
	pub(crate) value_maps: Pool<HashMap<Checksum, AssetValue>>,
}

impl AssetPools {
	pub(crate) fn new(config: &PoolConfig) -> Self {
		Self {
			checksum_sets: Pool::new(config),
			value_maps: Pool::new(config),
		}
	}
}
