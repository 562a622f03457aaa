mod util;

mod tests {
    use mexrs::{
        mex_sys::{host, mxDestroyArray, mxDuplicateArray},
        prelude::*,
    };

    fn empty_array() {
        let array = MxArray::default();
        assert!(array.is_null());
        assert!(!array.is_owner());
        assert!(array.is_empty());
        assert_eq!(array.class_name(), "unknown");
        assert_eq!(format!("{:?}", array), "MxArray(empty)");
    }

    fn take_transfers_ownership() {
        let mut owner = MxArray::from_value(&[1i32, 2, 3][..]).unwrap();
        let ptr = owner.as_ptr();

        let taken = owner.take();
        assert!(owner.is_null());
        assert!(!owner.is_owner());
        assert!(taken.is_owner());
        assert_eq!(taken.as_ptr(), ptr);

        let viewer = taken.view();
        let mut borrowed = unsafe { MxArray::borrowed(viewer.as_ptr()) };
        let moved = borrowed.take();
        assert!(borrowed.is_null());
        assert!(!moved.is_owner());
        assert_eq!(moved.as_ptr(), ptr);
    }

    fn release_borrowed_copies() {
        let owner = MxArray::from_value("abc").unwrap();
        let mut borrowed = owner.view();

        let copy = borrowed.release().unwrap();
        assert!(borrowed.is_null());
        assert_ne!(copy as *const _, owner.as_ptr());

        let copy = unsafe { MxArray::from_owned(copy) };
        assert_eq!(copy.to::<String>().unwrap(), "abc");
        assert_eq!(owner.to::<String>().unwrap(), "abc");
    }

    fn release_owned_gives_up_the_handle() {
        let mut owner = MxArray::from_value(&7u16).unwrap();
        let ptr = owner.as_ptr();
        let released = owner.release().unwrap();
        assert_eq!(released as *const _, ptr);
        assert!(owner.is_null());

        let owner = unsafe { MxArray::from_owned(released) };
        assert_eq!(owner.to::<u16>().unwrap(), 7);
    }

    fn reset_replaces_the_handle() {
        let mut array = MxArray::from_value(&1.0).unwrap();
        array.reset();
        assert!(array.is_null());

        let other = MxArray::from_value(&2.0).unwrap();
        unsafe { array.reset_borrowed(other.as_ptr()) };
        assert!(!array.is_owner());
        assert_eq!(array.to::<f64>().unwrap(), 2.0);

        let raw = unsafe { mxDuplicateArray(other.as_ptr()) };
        unsafe { array.reset_owned(raw) };
        assert!(array.is_owner());
        assert_ne!(array.as_ptr(), other.as_ptr());
        assert_eq!(array.to::<f64>().unwrap(), 2.0);
    }

    fn clones_are_deep() {
        let mut cell = MxArray::cell_matrix(1, 1).unwrap();
        cell.set(0, "inner").unwrap();

        let mut copy = cell.try_clone().unwrap();
        copy.set(0, "changed").unwrap();
        assert_eq!(cell.at::<String>(0).unwrap(), "inner");
        assert_eq!(copy.at::<String>(0).unwrap(), "changed");

        let raw = MxArray::to_raw(&3u8).unwrap();
        let array = unsafe { MxArray::from_owned(raw) };
        assert!(array.is_uint8());
    }

    fn borrowed_views_are_read_only() {
        let mut cell = MxArray::cell_matrix(1, 2).unwrap();
        cell.set(0, &1.0).unwrap();

        let mut element = cell.cell(0).unwrap().unwrap();
        assert!(!element.is_owner());
        assert_eq!(
            element.set(0, &2.0).unwrap_err().identifier(),
            "mexrs:ownership"
        );
        assert!(element.as_mut_slice::<f64>().is_err());
    }

    fn every_handle_is_destroyed_once() {
        let before = host::live_arrays();
        {
            let a = MxArray::from_value(&vec![1, 2, 3]).unwrap();
            let _copy = a.try_clone().unwrap();
            let _view = a.view();
            assert_eq!(host::live_arrays(), before + 2);
        }
        assert_eq!(host::live_arrays(), before);

        let mut a = MxArray::from_value("released").unwrap();
        let raw = a.release().unwrap();
        drop(a);
        assert_eq!(host::live_arrays(), before + 1);
        unsafe { mxDestroyArray(raw) };
        assert_eq!(host::live_arrays(), before);

        let mut a = MxArray::from_value(&1.0).unwrap();
        let b = a.take();
        a.reset();
        assert_eq!(host::live_arrays(), before + 1);
        drop(b);
        assert_eq!(host::live_arrays(), before);
    }

    #[test]
    fn memory_tests() {
        empty_array();
        take_transfers_ownership();
        release_borrowed_copies();
        release_owned_gives_up_the_handle();
        reset_replaces_the_handle();
        clones_are_deep();
        borrowed_views_are_read_only();
        every_handle_is_destroyed_once();
    }
}
