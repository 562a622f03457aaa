mod util;

mod tests {
    use std::sync::Arc;

    use mexrs::{mex_sys::host, prelude::*, session};

    #[derive(Debug)]
    struct Counter {
        count: u32,
    }

    #[derive(Debug)]
    struct Resource {
        _marker: Arc<()>,
    }

    fn lifecycle() {
        let before = host::lock_count();
        let id = Session::create(Counter { count: 0 });
        assert!(Session::<Counter>::exists(id));
        assert_eq!(host::lock_count(), before + 1);

        Session::<Counter>::with_mut(id, |c| c.count += 2).unwrap();
        assert_eq!(Session::<Counter>::with(id, |c| c.count).unwrap(), 2);

        let instance = Session::<Counter>::get(id).unwrap();
        instance.lock().count += 1;
        assert_eq!(Session::<Counter>::with(id, |c| c.count).unwrap(), 3);

        assert!(Session::<Counter>::destroy(id));
        assert!(!Session::<Counter>::exists(id));
        assert_eq!(host::lock_count(), before);

        assert!(!Session::<Counter>::destroy(id));
        assert_eq!(host::lock_count(), before);

        let err = Session::<Counter>::with(id, |c| c.count).unwrap_err();
        assert_eq!(err.identifier(), "mexrs:session:notFound");
        assert_eq!(instance.lock().count, 3);
    }

    fn identities_are_unique() {
        let a = Session::create(Counter { count: 1 });
        let b = Session::create(Counter { count: 2 });
        assert_ne!(a, b);
        assert_eq!(Session::<Counter>::len(), 2);
        assert_eq!(Session::<Counter>::with(b, |c| c.count).unwrap(), 2);

        let mut ids = vec![a, b];
        ids.sort();
        assert_eq!(Session::<Counter>::identities(), ids);

        let before = host::lock_count();
        Session::<Counter>::clear();
        assert!(Session::<Counter>::is_empty());
        assert_eq!(host::lock_count(), before - 2);
    }

    fn identities_cross_the_boundary() {
        let array = Session::create_array(Counter { count: 5 }).unwrap();
        assert_eq!(array.class_id(), ClassId::ISIZE);
        assert!(Session::<Counter>::exists_in(&array).unwrap());
        assert_eq!(Session::<Counter>::with_from(&array, |c| c.count).unwrap(), 5);
        Session::<Counter>::with_mut_from(&array, |c| c.count = 6).unwrap();
        assert_eq!(Session::<Counter>::get_from(&array).unwrap().lock().count, 6);

        let id = Session::<Counter>::decode_id(&array).unwrap();
        let unsigned = MxArray::from_value(&(id as usize)).unwrap();
        assert!(Session::<Counter>::exists_in(&unsigned).unwrap());

        assert!(Session::<Counter>::destroy_from(&array).unwrap());
        assert!(!Session::<Counter>::exists_in(&unsigned).unwrap());
    }

    fn invalid_identities() {
        let empty = MxArray::numeric::<i64>(0, 1).unwrap();
        assert_eq!(
            Session::<Counter>::decode_id(&empty).unwrap_err().identifier(),
            "mexrs:session:invalidType"
        );

        let double = MxArray::from_value(&1.0).unwrap();
        let err = Session::<Counter>::get_from(&double).unwrap_err();
        assert_eq!(err.identifier(), "mexrs:session:invalidType");

        let narrow = MxArray::from_value(&1i16).unwrap();
        assert!(Session::<Counter>::exists_in(&narrow).is_err());
        assert!(Session::<Counter>::destroy_from(&MxArray::empty()).is_err());
    }

    fn nested_access_reports_instances_in_use() {
        let a = Session::create(Counter { count: 1 });
        let b = Session::create(Counter { count: 2 });

        let merged = Session::<Counter>::with_mut(a, |x| {
            let other = Session::<Counter>::with(b, |y| y.count)?;
            x.count += other;
            Session::<Counter>::with(a, |y| y.count)
        })
        .unwrap();
        assert_eq!(merged.unwrap_err().identifier(), "mexrs:session:inUse");
        assert_eq!(Session::<Counter>::with(a, |x| x.count).unwrap(), 3);

        let instance = Session::<Counter>::get(a).unwrap();
        let guard = instance.lock();
        assert!(Session::<Counter>::with_mut(a, |x| x.count = 0).is_err());
        drop(guard);
        Session::<Counter>::with_mut(a, |x| x.count = 0).unwrap();

        Session::<Counter>::destroy(a);
        Session::<Counter>::destroy(b);
    }

    fn clear_all_destroys_every_type() {
        let before = host::lock_count();
        let marker = Arc::new(());
        Session::create(Counter { count: 0 });
        Session::create(Resource {
            _marker: marker.clone(),
        });
        assert_eq!(host::lock_count(), before + 2);
        assert_eq!(Arc::strong_count(&marker), 2);

        session::clear_all();
        assert_eq!(host::lock_count(), before);
        assert_eq!(Arc::strong_count(&marker), 1);
        assert!(Session::<Counter>::is_empty());
        assert!(Session::<Resource>::is_empty());
    }

    #[test]
    fn session_tests() {
        lifecycle();
        identities_are_unique();
        identities_cross_the_boundary();
        invalid_identities();
        nested_access_reports_instances_in_use();
        clear_all_destroys_every_type();
    }
}
