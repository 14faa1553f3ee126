use std::cell::Cell;

use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::path::AssetPath;

fn pending(name: &str) -> ImageHandle {
    ImageHandle::new_pending(AssetPath::new(name).unwrap())
}

fn image() -> PreparedImage {
    PreparedImage::from_straight_rgba8(1, 1, vec![1, 2, 3, 255]).unwrap()
}

fn counter() -> (Rc<Cell<u32>>, impl FnOnce(&[ImageHandle]) + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    (hits, move |_: &[ImageHandle]| h.set(h.get() + 1))
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![vec![]];
    }
    let mut out = Vec::new();
    for p in permutations(n - 1) {
        for i in 0..=p.len() {
            let mut q = p.clone();
            q.insert(i, n - 1);
            out.push(q);
        }
    }
    out
}

#[test]
fn fires_once_for_every_completion_order() {
    for order in permutations(4) {
        let handles: Vec<_> = (0..4).map(|i| pending(&format!("{i}.png"))).collect();
        let (hits, cb) = counter();
        let token = LoadBarrier::join(handles.clone(), cb);

        for (step, &i) in order.iter().enumerate() {
            assert_eq!(hits.get(), 0, "fired early at step {step} of {order:?}");
            handles[i].settle(Ok(image()));
        }
        assert_eq!(hits.get(), 1, "order {order:?}");
        assert!(token.is_fired());

        // Late duplicate completions change nothing.
        for h in &handles {
            h.settle(Ok(image()));
        }
        assert_eq!(hits.get(), 1);
    }
}

#[test]
fn mixed_sync_and_async_completion_fires_once() {
    for order in permutations(3) {
        let handles: Vec<_> = (0..4).map(|i| pending(&format!("{i}.png"))).collect();
        // One handle is already complete at attach time.
        handles[3].settle(Ok(image()));

        let (hits, cb) = counter();
        LoadBarrier::join(handles.clone(), cb);
        for &i in &order {
            handles[i].settle(Ok(image()));
        }
        assert_eq!(hits.get(), 1, "order {order:?}");
    }
}

#[test]
fn all_cached_fires_synchronously() {
    let handles: Vec<_> = (0..3).map(|i| pending(&format!("{i}.png"))).collect();
    for h in &handles {
        h.settle(Ok(image()));
    }
    let (hits, cb) = counter();
    let token = LoadBarrier::join(handles, cb);
    assert_eq!(hits.get(), 1);
    assert!(token.is_fired());
    assert!(!token.is_pending());
}

#[test]
fn empty_join_completes_immediately() {
    let (hits, cb) = counter();
    LoadBarrier::join(vec![], cb);
    assert_eq!(hits.get(), 1);
}

#[test]
fn failure_reports_once_and_blocks_completion() {
    let handles: Vec<_> = (0..3).map(|i| pending(&format!("{i}.png"))).collect();
    let (hits, cb) = counter();
    let failures = Rc::new(Cell::new(0));
    let f = failures.clone();
    let token = LoadBarrier::join_with_failure(handles.clone(), cb, move |bad| {
        assert_eq!(bad.path().as_str(), "1.png");
        f.set(f.get() + 1);
    });

    handles[0].settle(Ok(image()));
    handles[1].settle(Err(crate::SpriteError::asset_load("broken")));
    handles[2].settle(Ok(image()));

    assert_eq!(hits.get(), 0);
    assert_eq!(failures.get(), 1);
    assert!(token.is_failed());
}

#[test]
fn cancelled_join_never_fires() {
    let handles: Vec<_> = (0..2).map(|i| pending(&format!("{i}.png"))).collect();
    let (hits, cb) = counter();
    let token = LoadBarrier::join(handles.clone(), cb);
    token.cancel();
    for h in &handles {
        h.settle(Ok(image()));
    }
    assert_eq!(hits.get(), 0);
    assert!(!token.is_pending());
    assert!(!token.is_fired());
}

#[test]
fn overlapping_joins_keep_separate_flags() {
    let shared = pending("shared.png");
    let a_only = pending("a.png");

    let (hits_a, cb_a) = counter();
    let (hits_b, cb_b) = counter();
    let ta = LoadBarrier::join(vec![shared.clone(), a_only.clone()], cb_a);
    let tb = LoadBarrier::join(vec![shared.clone()], cb_b);
    assert_eq!(ta.handles().len(), 2);
    assert!(ta.handles()[0].ptr_eq(&shared));
    assert!(ta.handles()[1].ptr_eq(&a_only));
    assert!(tb.handles()[0].ptr_eq(&shared));

    shared.settle(Ok(image()));
    assert_eq!(hits_a.get(), 0);
    assert_eq!(hits_b.get(), 1);
    assert!(ta.is_pending());
    assert!(tb.is_fired());

    a_only.settle(Ok(image()));
    assert_eq!(hits_a.get(), 1);
    assert_eq!(hits_b.get(), 1);
}
