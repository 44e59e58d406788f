// ============================================================================
// spark-tree - Ergonomic Macros
// ============================================================================

/// Build a [`Path`](crate::Path) from segments.
///
/// String expressions become map keys, `usize` expressions become list indices.
///
/// ```rust
/// use spark_tree::{path, Path, Seg};
///
/// let p = path!("create", "stations", 0, "title");
/// assert_eq!(p.len(), 4);
/// assert_eq!(p[2], Seg::Index(0));
/// assert_eq!(path!(), Path::root());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $(
            p.push($crate::Seg::from($seg));
        )+
        p
    }};
}

/// Clone variables into a move closure.
///
/// ```rust
/// use spark_tree::{cloned, tick, Tree};
/// use serde_json::json;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let tree = Tree::from_json(json!({ "n": 1 }));
/// let seen = Rc::new(Cell::new(0));
///
/// tree.on_update(cloned!(seen => move || seen.set(seen.get() + 1)));
///
/// tree.root()["n"].set(2);
/// tick();
/// assert_eq!(seen.get(), 1);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}
