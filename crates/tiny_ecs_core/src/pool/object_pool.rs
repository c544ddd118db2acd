use serde::Serialize;
use tracing::trace;

/// Growth rate applied to the allocated total when the free list runs dry.
pub const GROWTH_FACTOR: f64 = 0.2;

/// Types that can be recycled by an [`ObjectPool`].
///
/// `reinit` is called on every instance handed out by [`ObjectPool::acquire`],
/// whether it was freshly constructed or recycled. Released instances keep
/// whatever state they had until that call.
pub trait Poolable {
    fn reinit(&mut self);
}

/// Implement [`Poolable`] by resetting to `Default::default()`.
///
/// # Example
/// ```ignore
/// #[derive(Default)]
/// struct Health { value: i32 }
///
/// poolable_by_default!(Health);
/// ```
#[macro_export]
macro_rules! poolable_by_default {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::pool::Poolable for $ty {
                #[inline]
                fn reinit(&mut self) {
                    *self = <$ty as ::core::default::Default>::default();
                }
            }
        )+
    };
}

/// Allocation counters for one pool.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub used: usize,
    pub size: usize,
}

/// Free-list allocator that recycles instances instead of dropping them.
///
/// The pool does not track ownership. Releasing the same instance twice, or
/// touching an instance after releasing it, is a caller bug the pool will not
/// detect.
pub struct ObjectPool<T> {
    free: Vec<T>,
    count: usize,
    factory: fn() -> T,
}

impl<T: Poolable> ObjectPool<T> {
    /// Create an empty pool that builds new instances with `factory`.
    pub fn new(factory: fn() -> T) -> Self {
        Self {
            free: Vec::new(),
            count: 0,
            factory,
        }
    }

    /// Take an instance out of the pool, growing it by roughly 20% when empty.
    pub fn acquire(&mut self) -> T {
        let mut item = match self.free.pop() {
            Some(item) => item,
            None => {
                self.expand(growth_for(self.count));
                // expand always adds at least one instance
                self.free.pop().unwrap_or_else(self.factory)
            }
        };
        item.reinit();
        item
    }

    /// Hand an instance back for reuse.
    #[inline]
    pub fn release(&mut self, item: T) {
        self.free.push(item);
    }

    /// Allocate `count` new instances onto the free list.
    pub fn expand(&mut self, count: usize) {
        self.free.reserve(count);
        for _ in 0..count {
            self.free.push((self.factory)());
        }
        self.count += count;
        trace!(added = count, total = self.count, "object pool expanded");
    }

    /// Total instances allocated by this pool (free and in use).
    #[inline]
    pub fn total_size(&self) -> usize {
        self.count
    }

    /// Instances currently sitting on the free list.
    #[inline]
    pub fn total_free(&self) -> usize {
        self.free.len()
    }

    /// Instances currently handed out.
    #[inline]
    pub fn total_used(&self) -> usize {
        self.count.saturating_sub(self.free.len())
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            used: self.total_used(),
            size: self.total_size(),
        }
    }
}

impl<T: Poolable + Default> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

/// Number of instances added when a pool of `total` runs dry.
#[inline]
pub fn growth_for(total: usize) -> usize {
    (total as f64 * GROWTH_FACTOR).round() as usize + 1
}
