//! Compilations share no state, so threads see the same results as a
//! sequential run.

use pikdraw::{Diagram, Error, Options, Rendered, compile};
use std::thread;

const SOURCES: &[&str] = &[
    "box \"one\"; arrow; circle \"two\"",
    "down\nbox; box; box",
    "A: box\nB: box at A + (2, 1)\narrow from A.e to B.w",
    "scale = 1.5\nellipse \"big\" bold\nspline right then up then right",
    "[ box; circle ] \"group\"\narrow\ncylinder",
    "box at C",
    "define pair { box $1; box $2 }\npair(\"a\", \"b\")",
];

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn public_types_cross_threads() {
    assert_send_sync::<Diagram>();
    assert_send_sync::<Rendered>();
    assert_send_sync::<Options>();
    assert_send_sync::<Error>();
}

#[test]
fn parallel_compiles_match_sequential_ones() {
    let options = Options::default();
    let sequential: Vec<Result<String, String>> = SOURCES
        .iter()
        .map(|s| compile(s, &options).map(|r| r.svg).map_err(|e| e.to_string()))
        .collect();

    let parallel: Vec<Result<String, String>> = thread::scope(|scope| {
        let handles: Vec<_> = SOURCES
            .iter()
            .map(|s| {
                let options = &options;
                scope.spawn(move || compile(s, options).map(|r| r.svg).map_err(|e| e.to_string()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
    assert!(sequential[5].is_err());
}
