//! Cache of decode plans keyed by destination type.
//!
//! By default lookups go through a pool of scratch maps.
//! A caller borrows one map, works on it privately and puts it back,
//! so no lock is held while a plan is compiled. Two callers racing on the
//! same missing plan may both compile it into different maps.
//! Plans are pure functions of the resolved record and destination type,
//! so the duplicate is wasted work, never a wrong result.
//!
//! With `shared-plan-cache` feature a single map behind a read-write lock
//! is used instead. The first plan published for a type wins.

use core::{
    any::TypeId,
    hash::{BuildHasher, Hasher},
    mem::size_of,
};
use std::{fmt, sync::Arc};

use hashbrown::HashMap;

use crate::{error::Result, plan::DecodePlan};

type PlanMap = HashMap<TypeId, Arc<DecodePlan>, TypeIdHasherBuilder>;

cfg_if::cfg_if! {
    if #[cfg(feature = "shared-plan-cache")] {
        use hashbrown::hash_map::Entry;
        use parking_lot::RwLock;

        pub(crate) struct PlanCache {
            plans: RwLock<PlanMap>,
        }

        impl PlanCache {
            pub fn new() -> Self {
                PlanCache {
                    plans: RwLock::new(PlanMap::default()),
                }
            }

            pub fn get_or_compile(
                &self,
                id: TypeId,
                compile: impl FnOnce() -> Result<DecodePlan>,
            ) -> Result<Arc<DecodePlan>> {
                if let Some(plan) = self.plans.read().get(&id) {
                    tracing::trace!(?id, "decode plan cache hit");
                    return Ok(plan.clone());
                }

                let plan = Arc::new(compile()?);

                let mut plans = self.plans.write();
                match plans.entry(id) {
                    Entry::Occupied(entry) => Ok(entry.get().clone()),
                    Entry::Vacant(entry) => Ok(entry.insert(plan).clone()),
                }
            }
        }
    } else {
        use core::ops::{Deref, DerefMut};
        use parking_lot::Mutex;

        pub(crate) struct PlanCache {
            pool: Mutex<Vec<PlanMap>>,
        }

        impl PlanCache {
            pub fn new() -> Self {
                PlanCache {
                    pool: Mutex::new(Vec::new()),
                }
            }

            pub fn get_or_compile(
                &self,
                id: TypeId,
                compile: impl FnOnce() -> Result<DecodePlan>,
            ) -> Result<Arc<DecodePlan>> {
                let mut scratch = self.borrow();
                if let Some(plan) = scratch.get(&id) {
                    tracing::trace!(?id, "decode plan cache hit");
                    return Ok(plan.clone());
                }

                let plan = Arc::new(compile()?);
                scratch.insert(id, plan.clone());
                Ok(plan)
            }

            fn borrow(&self) -> Scratch<'_> {
                let map = self.pool.lock().pop().unwrap_or_default();
                Scratch {
                    pool: &self.pool,
                    map,
                }
            }
        }

        /// Map borrowed from the pool.
        /// Goes back to the pool when dropped.
        struct Scratch<'a> {
            pool: &'a Mutex<Vec<PlanMap>>,
            map: PlanMap,
        }

        impl Deref for Scratch<'_> {
            type Target = PlanMap;

            #[inline(always)]
            fn deref(&self) -> &PlanMap {
                &self.map
            }
        }

        impl DerefMut for Scratch<'_> {
            #[inline(always)]
            fn deref_mut(&mut self) -> &mut PlanMap {
                &mut self.map
            }
        }

        impl Drop for Scratch<'_> {
            fn drop(&mut self) {
                let map = core::mem::take(&mut self.map);
                self.pool.lock().push(map);
            }
        }
    }
}

impl fmt::Debug for PlanCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanCache").finish_non_exhaustive()
    }
}

/// Hasher for `TypeId` keys.
/// `TypeId` is already a hash, so its bits are taken as is.
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    fn write(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(size_of::<u64>());
        let mut buf = [0u8; size_of::<u64>()];
        buf[..len].copy_from_slice(&bytes[..len]);
        self.0 = u64::from_ne_bytes(buf);
    }

    #[inline(always)]
    fn write_u128(&mut self, i: u128) {
        self.0 = i as u64;
    }

    #[inline(always)]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline(always)]
    fn finish(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct TypeIdHasherBuilder;

impl BuildHasher for TypeIdHasherBuilder {
    type Hasher = TypeIdHasher;

    #[inline(always)]
    fn build_hasher(&self) -> TypeIdHasher {
        TypeIdHasher(0)
    }
}
