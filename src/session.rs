//! Keep native objects alive across calls.
//!
//! A MEX binary is loaded once and called many times. [`Session<T>`] stores instances of `T`
//! between calls and hands out an integer identity that the caller passes back to find the
//! instance again. Every live instance pins the binary with `mexLock`, so it can't be unloaded
//! while it still owns state; destroying an instance releases that pin.
//!
//! ```
//! use mexrs::session::Session;
//!
//! struct Counter(u32);
//!
//! let id = Session::create(Counter(0));
//! Session::<Counter>::with_mut(id, |c| c.0 += 1).unwrap();
//! assert_eq!(Session::<Counter>::with(id, |c| c.0).unwrap(), 1);
//!
//! assert!(Session::<Counter>::destroy(id));
//! assert!(!Session::<Counter>::exists(id));
//! ```
//!
//! Identities cross the host boundary as a 1x1 array of the pointer-width integer class, see
//! [`Session::encode_id`] and [`Session::decode_id`].
//!
//! All registries live in one process-wide map keyed by the `TypeId` of the stored type. The map
//! is empty until a session is first created and is torn down by [`clear_all`], which the
//! dispatcher registers as the exit function of the binary.

use std::{
    any::{type_name, Any, TypeId},
    collections::BTreeMap,
    marker::PhantomData,
    sync::Arc,
};

use fnv::FnvHashMap;
use log::debug;
use mex_sys::{mexLock, mexUnlock};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

use crate::{
    array::MxArray,
    error::{MexResult, SessionError},
    types::ClassId,
};

/// A shared handle to an instance stored in a session.
pub type Instance<T> = Arc<Mutex<T>>;

trait Registry: Send {
    fn len(&self) -> usize;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Instances<T> {
    map: BTreeMap<isize, Instance<T>>,
}

impl<T: Send + 'static> Registry for Instances<T> {
    fn len(&self) -> usize {
        self.map.len()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

static REGISTRIES: Lazy<Mutex<FnvHashMap<TypeId, Box<dyn Registry>>>> =
    Lazy::new(|| Mutex::new(FnvHashMap::default()));

fn with_instances<T: Send + 'static, R>(f: impl FnOnce(&mut BTreeMap<isize, Instance<T>>) -> R) -> R {
    let mut registries = REGISTRIES.lock();
    let registry = registries
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::new(Instances::<T> { map: BTreeMap::new() }));

    match registry.as_any_mut().downcast_mut::<Instances<T>>() {
        Some(instances) => f(&mut instances.map),
        None => unreachable!("registry of {} has the wrong type", type_name::<T>()),
    }
}

fn unpin(count: usize) {
    for _ in 0..count {
        unsafe { mexUnlock() }
    }
}

/// The registry of live instances of `T`.
pub struct Session<T>(PhantomData<fn() -> T>);

impl<T: Send + 'static> Session<T> {
    /// Store `instance` and return its identity. The binary stays locked until the instance is
    /// destroyed.
    pub fn create(instance: T) -> isize {
        let instance = Arc::new(Mutex::new(instance));
        let id = Arc::as_ptr(&instance) as isize;
        with_instances::<T, _>(|map| map.insert(id, instance));

        unsafe { mexLock() };
        debug!("created {} session {}", type_name::<T>(), id);
        id
    }

    /// A shared handle to instance `id`.
    pub fn get(id: isize) -> MexResult<Instance<T>> {
        match with_instances::<T, _>(|map| map.get(&id).cloned()) {
            Some(instance) => Ok(instance),
            None => Err(SessionError::NotFound {
                id,
                type_name: type_name::<T>().into(),
            })?,
        }
    }

    /// Call `f` with a shared reference to instance `id`.
    ///
    /// Fails instead of blocking if the instance is already borrowed, for example by an enclosing
    /// call to [`Session::with_mut`] for the same identity.
    pub fn with<R>(id: isize, f: impl FnOnce(&T) -> R) -> MexResult<R> {
        let instance = Self::get(id)?;
        let guard = Self::lock(id, &instance)?;
        Ok(f(&guard))
    }

    /// Call `f` with a mutable reference to instance `id`. See [`Session::with`].
    pub fn with_mut<R>(id: isize, f: impl FnOnce(&mut T) -> R) -> MexResult<R> {
        let instance = Self::get(id)?;
        let mut guard = Self::lock(id, &instance)?;
        Ok(f(&mut guard))
    }

    fn lock(id: isize, instance: &Instance<T>) -> MexResult<MutexGuard<'_, T>> {
        match instance.try_lock() {
            Some(guard) => Ok(guard),
            None => Err(SessionError::InUse {
                id,
                type_name: type_name::<T>().into(),
            })?,
        }
    }

    /// Returns `true` if instance `id` is alive.
    pub fn exists(id: isize) -> bool {
        with_instances::<T, _>(|map| map.contains_key(&id))
    }

    /// Remove instance `id` and release its pin on the binary. Returns `false` if there was no
    /// such instance, in which case nothing happens.
    ///
    /// The instance is dropped when the last [`Instance`] handle to it is gone.
    pub fn destroy(id: isize) -> bool {
        let removed = with_instances::<T, _>(|map| map.remove(&id));
        match removed {
            Some(instance) => {
                unpin(1);
                debug!("destroyed {} session {}", type_name::<T>(), id);
                drop(instance);
                true
            }
            None => false,
        }
    }

    /// Remove all instances, releasing one pin per instance.
    pub fn clear() {
        let instances = with_instances::<T, _>(std::mem::take);
        unpin(instances.len());
        debug!("cleared {} {} sessions", instances.len(), type_name::<T>());
    }

    /// The number of live instances.
    pub fn len() -> usize {
        with_instances::<T, _>(|map| map.len())
    }

    /// Returns `true` if there are no live instances.
    pub fn is_empty() -> bool {
        Self::len() == 0
    }

    /// The identities of all live instances in ascending order.
    pub fn identities() -> Vec<isize> {
        with_instances::<T, _>(|map| map.keys().copied().collect())
    }

    /// Store `instance` and return its identity as an array.
    pub fn create_array(instance: T) -> MexResult<MxArray<'static>> {
        Self::encode_id(Self::create(instance))
    }

    /// A shared handle to the instance whose identity is stored in `array`.
    pub fn get_from(array: &MxArray<'_>) -> MexResult<Instance<T>> {
        Self::get(Self::decode_id(array)?)
    }

    /// See [`Session::with`].
    pub fn with_from<R>(array: &MxArray<'_>, f: impl FnOnce(&T) -> R) -> MexResult<R> {
        Self::with(Self::decode_id(array)?, f)
    }

    /// See [`Session::with_mut`].
    pub fn with_mut_from<R>(array: &MxArray<'_>, f: impl FnOnce(&mut T) -> R) -> MexResult<R> {
        Self::with_mut(Self::decode_id(array)?, f)
    }

    /// See [`Session::exists`].
    pub fn exists_in(array: &MxArray<'_>) -> MexResult<bool> {
        Ok(Self::exists(Self::decode_id(array)?))
    }

    /// See [`Session::destroy`].
    pub fn destroy_from(array: &MxArray<'_>) -> MexResult<bool> {
        Ok(Self::destroy(Self::decode_id(array)?))
    }

    /// Encode identity `id` as a 1x1 array of the pointer-width signed integer class.
    pub fn encode_id(id: isize) -> MexResult<MxArray<'static>> {
        MxArray::from_value(&id)
    }

    /// Read an identity from `array`, which must hold at least one element of the pointer-width
    /// signed or unsigned integer class.
    pub fn decode_id(array: &MxArray<'_>) -> MexResult<isize> {
    if array.is_empty() {
        Err(SessionError::EmptyIdentity)?;
    }

    let class = array.class_id();
    if array.is_complex() || (class != ClassId::ISIZE && class != ClassId::USIZE) {
        let found = if array.is_complex() {
            format!("complex {}", class.name())
        } else {
            class.name().into()
        };

        Err(SessionError::InvalidIdentity {
            expected: format!("real {} or {}", ClassId::ISIZE, ClassId::USIZE),
            found,
        })?;
    }

    if class == ClassId::ISIZE {
        Ok(array.as_slice::<isize>()?[0])
    } else {
        Ok(array.as_slice::<usize>()?[0] as isize)
    }
}
}

/// Destroy every instance of every type, releasing all pins.
pub fn clear_all() {
    let registries = std::mem::take(&mut *REGISTRIES.lock());
    let count: usize = registries.values().map(|r| r.len()).sum();
    unpin(count);
    debug!("cleared {} sessions", count);
}

#[cfg(test)]
mod tests {
    use mex_sys::host;

    use super::*;

    #[derive(Debug)]
    struct Plain(i32);
    #[derive(Debug)]
    struct Tracked(Arc<()>);
    #[derive(Debug)]
    struct Counted(u8);
    #[derive(Debug)]
    struct Shared(i32);

    #[test]
    fn lifecycle_pins_the_binary() {
        let before = host::lock_count();
        let id = Session::create(Plain(3));
        assert!(Session::<Plain>::exists(id));
        assert_eq!(host::lock_count(), before + 1);
        assert_eq!(Session::<Plain>::with(id, |p| p.0).unwrap(), 3);

        assert!(Session::<Plain>::destroy(id));
        assert!(!Session::<Plain>::destroy(id));
        assert_eq!(host::lock_count(), before);
        assert_eq!(
            Session::<Plain>::get(id).unwrap_err().identifier(),
            "mexrs:session:notFound"
        );
    }

    #[test]
    fn destroyed_instances_are_dropped() {
        let marker = Arc::new(());
        let id = Session::create(Tracked(marker.clone()));
        assert_eq!(Arc::strong_count(&marker), 2);

        Session::<Tracked>::destroy(id);
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn clear_releases_every_pin() {
        let before = host::lock_count();
        let a = Session::create(Counted(1));
        let b = Session::create(Counted(2));
        assert_eq!(Session::<Counted>::len(), 2);
        let mut ids = vec![a, b];
        ids.sort();
        assert_eq!(Session::<Counted>::identities(), ids);

        Session::<Counted>::clear();
        assert!(Session::<Counted>::is_empty());
        assert_eq!(host::lock_count(), before);
    }

    #[test]
    fn nested_access_to_one_instance_fails() {
        let id = Session::create(Shared(1));
        let nested = Session::<Shared>::with_mut(id, |a| {
            a.0 += 1;
            Session::<Shared>::with(id, |b| b.0)
        })
        .unwrap();
        assert_eq!(nested.unwrap_err().identifier(), "mexrs:session:inUse");

        let other = Session::create(Shared(10));
        let sum = Session::<Shared>::with(id, |a| Session::<Shared>::with(other, |b| a.0 + b.0))
            .unwrap()
            .unwrap();
        assert_eq!(sum, 12);

        Session::<Shared>::destroy(id);
        Session::<Shared>::destroy(other);
    }

    #[test]
    fn identities_need_a_pointer_width_class() {
        let array = Session::<Plain>::encode_id(17).unwrap();
        assert_eq!(array.class_id(), ClassId::ISIZE);
        assert_eq!(Session::<Plain>::decode_id(&array).unwrap(), 17);

        let array = MxArray::from_value(&17usize).unwrap();
        assert_eq!(Session::<Plain>::decode_id(&array).unwrap(), 17);

        let array = MxArray::from_value(&17.0).unwrap();
        assert_eq!(
            Session::<Plain>::decode_id(&array).unwrap_err().identifier(),
            "mexrs:session:invalidType"
        );

        let id = Session::create(Plain(5));
        let mut array = MxArray::with_elements(ClassId::ISIZE, true, 1, 1).unwrap();
        array.as_mut_slice::<isize>().unwrap()[0] = id;
        assert!(array.is_complex());
        assert_eq!(
            Session::<Plain>::decode_id(&array).unwrap_err().identifier(),
            "mexrs:session:invalidType"
        );
        assert!(Session::<Plain>::destroy(id));

        let array = MxArray::from_value(&(isize::MAX - 1)).unwrap();
        assert_eq!(Session::<Plain>::decode_id(&array).unwrap(), isize::MAX - 1);

        let array = MxArray::numeric::<i64>(0, 0).unwrap();
        assert!(Session::<Plain>::decode_id(&array).is_err());
        assert!(Session::<Plain>::decode_id(&MxArray::empty()).is_err());
    }
}
