//! A fixed-capacity vector whose spare capacity is poisoned.
//!
//! `ShadowedVec` drives the annotator on every size change, so touching
//! `[len, capacity)` of its buffer reads as a container overflow in the
//! shadow table it was created with.

use std::alloc::{alloc, dealloc, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use std::ptr::{self, NonNull};
use std::slice;

use crate::api::shadow::ContainerShadow;
use crate::container::Region;
use crate::cs_emit;
use crate::shadow::ShadowOwner;
use crate::util::layout::GRANULE;

/// A vector with fixed capacity and annotated shadow.
///
/// Unlike `Vec`, this:
/// - Has a fixed capacity, changed only by an explicit [`reserve_exact`](Self::reserve_exact)
/// - Keeps `[beg, beg + len)` addressable and `[beg + len, end)` poisoned
/// - Hands its region back to the shadow owner fully addressable before
///   freeing or moving it
///
/// The buffer is aligned to at least one granule, so `beg` is always
/// granule-aligned and `end` is the true end of the allocation. Zero-sized
/// element types and zero capacity never touch the shadow table.
///
/// # Example
///
/// ```rust
/// use contshadow::{ContainerShadow, MemoryShadow, ShadowConfig};
///
/// let shadow = ContainerShadow::new(MemoryShadow::new(), ShadowConfig::default());
/// let mut list = shadow.vec_with_capacity::<u32>(16).unwrap();
/// list.push(7).unwrap();
/// list.push(9).unwrap();
/// assert!(list.is_shadow_consistent());
/// assert_eq!(list.pop(), Some(9));
/// ```
pub struct ShadowedVec<T, S: ShadowOwner> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    shadow: ContainerShadow<S>,
    _marker: PhantomData<T>,
}

// SAFETY: the buffer is uniquely owned like a `Vec<T>`, and all shadow
// access goes through the table lock inside `ContainerShadow`.
unsafe impl<T: Send, S: ShadowOwner + Send> Send for ShadowedVec<T, S> {}
unsafe impl<T: Sync, S: ShadowOwner + Send> Sync for ShadowedVec<T, S> {}

impl<T, S: ShadowOwner> ShadowedVec<T, S> {
    /// Allocate a vector with room for `capacity` elements.
    ///
    /// The owner unpoisons the new buffer, then the whole buffer is annotated
    /// as spare capacity. Returns `None` (and emits CS201) if the size
    /// overflows or the allocator fails.
    pub fn with_capacity_in(capacity: usize, shadow: ContainerShadow<S>) -> Option<Self> {
        if mem::size_of::<T>() == 0 || capacity == 0 {
            return Some(Self {
                ptr: NonNull::dangling(),
                len: 0,
                capacity,
                shadow,
                _marker: PhantomData,
            });
        }

        let ptr = Self::allocate(capacity)?;
        let vec = Self {
            ptr,
            len: 0,
            capacity,
            shadow,
            _marker: PhantomData,
        };
        vec.adopt_buffer();
        Some(vec)
    }

    fn layout_for(capacity: usize) -> Option<Layout> {
        let size = mem::size_of::<T>().checked_mul(capacity)?;
        let align = mem::align_of::<T>().max(GRANULE);
        Layout::from_size_align(size, align).ok()
    }

    fn allocate(capacity: usize) -> Option<NonNull<T>> {
        let Some(layout) = Self::layout_for(capacity) else {
            cs_emit!(
                CS201,
                "capacity {} of {}-byte elements",
                capacity,
                mem::size_of::<T>()
            );
            return None;
        };
        // SAFETY: callers only get here with a non-zero capacity of a
        // non-zero-sized type, so the layout has a non-zero size.
        let raw = unsafe { alloc(layout) };
        let ptr = NonNull::new(raw as *mut T);
        if ptr.is_none() {
            cs_emit!(CS201, "allocator returned null for {} bytes", layout.size());
        }
        ptr
    }

    fn tracks_shadow(&self) -> bool {
        mem::size_of::<T>() != 0 && self.capacity != 0
    }

    fn beg(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    fn addr_at(&self, index: usize) -> usize {
        self.beg() + index * mem::size_of::<T>()
    }

    fn end(&self) -> usize {
        self.addr_at(self.capacity)
    }

    fn move_mid(&self, old_len: usize, new_len: usize) {
        if self.tracks_shadow() {
            let (old_mid, new_mid) = (self.addr_at(old_len), self.addr_at(new_len));
            self.shadow.annotate(self.beg(), self.end(), old_mid, new_mid);
        }
    }

    /// Owner unpoisons the buffer, then `[beg + len, end)` is poisoned.
    fn adopt_buffer(&self) {
        if !self.tracks_shadow() {
            return;
        }
        let (beg, end) = (self.beg(), self.end());
        self.shadow.adopt_allocation(beg, end - beg);
        self.shadow.annotate(beg, end, end, self.addr_at(self.len));
    }

    /// Annotate back to fully addressable, discard the shadow, and free.
    ///
    /// Leaves `self.ptr` dangling; callers replace or forget it.
    fn release_buffer(&mut self) {
        if !self.tracks_shadow() {
            return;
        }
        let (beg, end) = (self.beg(), self.end());
        self.shadow.annotate(beg, end, self.addr_at(self.len), end);
        self.shadow.release_allocation(beg, end - beg);

        if let Some(layout) = Self::layout_for(self.capacity) {
            // SAFETY: `ptr` came from `alloc` with this exact layout.
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, layout) };
        }
    }

    /// Returns the number of elements in the vector.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the vector contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the capacity of the vector.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the remaining capacity.
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Returns true if the vector is full.
    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// The handle this vector annotates through.
    pub fn shadow(&self) -> &ContainerShadow<S> {
        &self.shadow
    }

    /// The buffer's address range.
    pub fn region(&self) -> Region {
        Region::new(self.beg(), self.end())
    }

    /// Address one past the last live element.
    pub fn mid(&self) -> usize {
        self.addr_at(self.len)
    }

    /// Push an element onto the vector.
    ///
    /// Returns `Err(value)` if the vector is full.
    pub fn push(&mut self, value: T) -> Result<(), T> {
        if self.is_full() {
            return Err(value);
        }
        self.move_mid(self.len, self.len + 1);
        // SAFETY: `len < capacity`, so the slot is inside the buffer.
        unsafe {
            self.ptr.as_ptr().add(self.len).write(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Pop an element from the vector.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` holds an initialized element.
        let value = unsafe { self.ptr.as_ptr().add(self.len).read() };
        self.move_mid(self.len + 1, self.len);
        Some(value)
    }

    /// Shorten the vector to `len` elements, dropping the rest.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let old_len = self.len;
        self.len = len;
        // SAFETY: `[len, old_len)` holds initialized elements that are no
        // longer reachable through `self`.
        unsafe {
            ptr::drop_in_place(slice::from_raw_parts_mut(
                self.ptr.as_ptr().add(len),
                old_len - len,
            ));
        }
        self.move_mid(old_len, len);
    }

    /// Clear the vector.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Get a reference to an element.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Get a mutable reference to an element.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Get a slice of the elements.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized; `ptr` is dangling only when
        // `len == 0` or `T` is zero-sized.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Get a mutable slice of the elements.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`, and `&mut self` is exclusive.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Iterate mutably over the elements.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Push from an iterator until it runs out or the vector is full.
    ///
    /// Returns the number of elements added. The boundary is annotated once
    /// for the whole batch.
    pub fn extend_from_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) -> usize {
        let (old_len, capacity) = (self.len, self.capacity);
        if old_len == capacity {
            return 0;
        }
        let mut iter = iter.into_iter();

        // Open the whole spare range and fill what the iterator yields. The
        // guard poisons whatever was not used, also if `next` panics.
        self.move_mid(old_len, capacity);
        let settle = SettleMid {
            vec: self,
            from: capacity,
        };
        while settle.vec.len < capacity {
            let Some(item) = iter.next() else { break };
            // SAFETY: `len < capacity`.
            unsafe {
                settle.vec.ptr.as_ptr().add(settle.vec.len).write(item);
            }
            settle.vec.len += 1;
        }
        settle.vec.len - old_len
    }

    /// Retain only elements that satisfy the predicate.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        let old_len = self.len;
        let base = self.ptr.as_ptr();
        let mut write = 0;
        // Elements are only reachable through the raw pointer while we
        // compact, so a panicking predicate leaks instead of double-dropping.
        // The shadow then follows the empty length.
        self.len = 0;
        let settle = SettleMid {
            vec: self,
            from: old_len,
        };
        for read in 0..old_len {
            // SAFETY: `read < old_len`, `write <= read`; each slot is either
            // moved once or dropped once.
            unsafe {
                let elem = &*base.add(read);
                if f(elem) {
                    if write != read {
                        ptr::copy_nonoverlapping(base.add(read), base.add(write), 1);
                    }
                    write += 1;
                } else {
                    ptr::drop_in_place(base.add(read));
                }
            }
        }
        settle.vec.len = write;
    }

    /// Grow the capacity by exactly `additional` elements.
    ///
    /// Moves the elements to a new buffer: the old region is annotated back
    /// to fully addressable and discarded, the new one is unpoisoned and its
    /// spare capacity poisoned. Returns false if the new buffer could not be
    /// allocated, in which case the vector is unchanged.
    pub fn reserve_exact(&mut self, additional: usize) -> bool {
        if additional == 0 {
            return true;
        }
        let Some(new_capacity) = self.capacity.checked_add(additional) else {
            cs_emit!(CS201, "capacity {} + {} overflows", self.capacity, additional);
            return false;
        };
        if mem::size_of::<T>() == 0 {
            self.capacity = new_capacity;
            return true;
        }

        let Some(new_ptr) = Self::allocate(new_capacity) else {
            return false;
        };

        #[cfg(feature = "log")]
        log::debug!(
            "reallocating shadowed vec {} from {} to {} elements",
            self.region(),
            self.capacity,
            new_capacity
        );

        // SAFETY: the new buffer holds at least `len` elements and does not
        // overlap the old one.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
        }
        self.release_buffer();
        self.ptr = new_ptr;
        self.capacity = new_capacity;
        self.adopt_buffer();
        true
    }

    /// Returns true if the shadow matches the current length.
    ///
    /// Uses the handle's configured [`VerifyMode`](crate::VerifyMode).
    pub fn is_shadow_consistent(&self) -> bool {
        if !self.tracks_shadow() {
            return true;
        }
        self.shadow.verify(self.beg(), self.mid(), self.end())
    }

    /// Like [`is_shadow_consistent`](Self::is_shadow_consistent), reporting
    /// CS101 on mismatch.
    pub fn check_shadow(&self) -> bool {
        if !self.tracks_shadow() {
            return true;
        }
        self.shadow.check(self.beg(), self.mid(), self.end())
    }
}

impl<T, S: ShadowOwner> Deref for ShadowedVec<T, S> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, S: ShadowOwner> DerefMut for ShadowedVec<T, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, S: ShadowOwner> Index<usize> for ShadowedVec<T, S> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<T, S: ShadowOwner> IndexMut<usize> for ShadowedVec<T, S> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.as_mut_slice()[index]
    }
}

impl<T: fmt::Debug, S: ShadowOwner> fmt::Debug for ShadowedVec<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, S: ShadowOwner> Drop for ShadowedVec<T, S> {
    fn drop(&mut self) {
        let len = self.len;
        let elems = ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), len);
        self.len = 0;
        self.move_mid(len, 0);
        let _release = ReleaseOnDrop(self);
        // SAFETY: `[0, len)` is initialized and no longer reachable through
        // the vector, so each element is dropped exactly once.
        unsafe { ptr::drop_in_place(elems) };
    }
}

/// Re-annotates the boundary from `from` to the vector's length on drop.
struct SettleMid<'a, T, S: ShadowOwner> {
    vec: &'a mut ShadowedVec<T, S>,
    from: usize,
}

impl<T, S: ShadowOwner> Drop for SettleMid<'_, T, S> {
    fn drop(&mut self) {
        self.vec.move_mid(self.from, self.vec.len);
    }
}

/// Hands the buffer back even if an element's drop panics.
struct ReleaseOnDrop<'a, T, S: ShadowOwner>(&'a mut ShadowedVec<T, S>);

impl<T, S: ShadowOwner> Drop for ReleaseOnDrop<'_, T, S> {
    fn drop(&mut self) {
        self.0.release_buffer();
    }
}

impl<T, S: ShadowOwner> IntoIterator for ShadowedVec<T, S> {
    type Item = T;
    type IntoIter = ShadowedVecIntoIter<T, S>;

    fn into_iter(self) -> Self::IntoIter {
        ShadowedVecIntoIter {
            vec: self,
            index: 0,
        }
    }
}

/// Consuming iterator for ShadowedVec.
pub struct ShadowedVecIntoIter<T, S: ShadowOwner> {
    vec: ShadowedVec<T, S>,
    index: usize,
}

impl<T, S: ShadowOwner> Iterator for ShadowedVecIntoIter<T, S> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vec.len {
            return None;
        }
        // SAFETY: slots in `[index, len)` are initialized and not yet read.
        let item = unsafe { self.vec.ptr.as_ptr().add(self.index).read() };
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vec.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<T, S: ShadowOwner> ExactSizeIterator for ShadowedVecIntoIter<T, S> {}

impl<T, S: ShadowOwner> Drop for ShadowedVecIntoIter<T, S> {
    fn drop(&mut self) {
        let len = self.vec.len;
        // SAFETY: `index <= len`, so the tail stays inside the buffer.
        let tail = unsafe {
            ptr::slice_from_raw_parts_mut(self.vec.ptr.as_ptr().add(self.index), len - self.index)
        };
        // Detach the tail first: the vector's own drop then only releases
        // the buffer, even if dropping the tail panics.
        self.vec.len = 0;
        self.vec.move_mid(len, 0);
        // SAFETY: `[index, len)` has not been yielded.
        unsafe { ptr::drop_in_place(tail) };
    }
}
