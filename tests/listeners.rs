use serde_json::json;
use spark_tree::{path, tick, Kind, Tree, TreeError, UpdateListener};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn counter(hits: &Rc<Cell<u32>>) -> UpdateListener {
    let hits = hits.clone();
    Rc::new(move || hits.set(hits.get() + 1))
}

#[test]
fn listeners_called_in_registration_order() {
    let tree = Tree::from_json(json!({ "n": 0 }));
    let order = Rc::new(RefCell::new(Vec::new()));
    for id in ["a", "b", "c"] {
        let order = order.clone();
        tree.on_update(move || order.borrow_mut().push(id));
    }

    tree.root()["n"].set(1);
    tick();
    assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
}

#[test]
fn duplicate_registration_is_called_twice() {
    let tree = Tree::from_json(json!({ "n": 0 }));
    let hits = Rc::new(Cell::new(0));
    let listener = counter(&hits);
    tree.add_update_listener(listener.clone());
    tree.add_update_listener(listener.clone());

    tree.root()["n"].set(1);
    tick();
    assert_eq!(hits.get(), 2);

    // Removing drops one registration at a time
    assert!(tree.remove_update_listener(Some(&listener)));
    tree.root()["n"].set(2);
    tick();
    assert_eq!(hits.get(), 3);
}

#[test]
fn remove_all_listeners() {
    let tree = Tree::from_json(json!({ "n": 0 }));
    let hits = Rc::new(Cell::new(0));
    tree.add_update_listener(counter(&hits));
    tree.add_update_listener(counter(&hits));

    assert!(tree.remove_update_listener(None));
    tree.root()["n"].set(1);
    tick();
    assert_eq!(hits.get(), 0);
    assert_eq!(tree.to_json(), json!({ "n": 1 }));
}

#[test]
fn listener_sees_the_new_root() {
    let tree = Tree::from_json(json!({ "user": { "name": "foo" } }));
    let seen = Rc::new(RefCell::new(None));
    let handle = tree.clone();
    let seen_clone = seen.clone();
    let listener = tree.on_update(move || {
        *seen_clone.borrow_mut() = handle.root()["user"]["name"].value().as_str().map(String::from);
    });

    tree.root()["user"]["name"].set("bar");
    tick();
    assert_eq!(seen.borrow().as_deref(), Some("bar"));
    tree.remove_update_listener(Some(&listener));
}

#[test]
fn listener_may_queue_the_next_batch() {
    let tree = Tree::from_json(json!({ "n": 0 }));
    let hits = Rc::new(Cell::new(0));
    let handle = tree.clone();
    let hits_clone = hits.clone();
    let listener = tree.on_update(move || {
        hits_clone.set(hits_clone.get() + 1);
        let n = handle.root()["n"].value().as_i64().unwrap_or(0);
        if n < 3 {
            handle.root()["n"].set(n + 1);
        }
    });

    tree.root()["n"].set(1);
    tick();
    assert_eq!(hits.get(), 1);
    assert!(tree.is_scheduled());

    spark_tree::flush();
    assert_eq!(hits.get(), 3);
    assert_eq!(tree.root()["n"].value().as_i64(), Some(3));
    tree.remove_update_listener(Some(&listener));
}

#[test]
fn listener_may_remove_itself() {
    let tree = Tree::from_json(json!({ "n": 0 }));
    let hits = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Option<UpdateListener>>> = Rc::new(RefCell::new(None));

    let handle = tree.clone();
    let hits_clone = hits.clone();
    let slot_clone = slot.clone();
    let listener = tree.on_update(move || {
        hits_clone.set(hits_clone.get() + 1);
        if let Some(me) = slot_clone.borrow_mut().take() {
            handle.remove_update_listener(Some(&me));
        }
    });
    *slot.borrow_mut() = Some(listener);

    tree.root()["n"].set(1);
    tick();
    tree.root()["n"].set(2);
    tick();
    assert_eq!(hits.get(), 1);
}

#[test]
fn error_listeners_receive_each_failure() {
    let tree = Tree::from_json(json!({ "list": [1], "name": "x" }));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let errors_clone = errors.clone();
    let listener = tree.on_error(move |err| errors_clone.borrow_mut().push(err.clone()));

    tree.set_at(path!("list", 5), 0);
    tree.set_at(path!("list", "key"), 0);
    tree.root()["name"].push(1);
    tree.root()["name"].try_update(|_| Err::<spark_tree::Value, _>("nope"));
    tick();

    assert_eq!(
        *errors.borrow(),
        vec![
            TreeError::invalid_push_target(path!("name"), Kind::Leaf),
            TreeError::index_out_of_bounds(path!("list"), 5, 1),
            TreeError::type_mismatch(path!("list"), Kind::Map, Kind::List),
            TreeError::update_failed(path!("name"), "nope"),
        ]
    );

    assert!(tree.remove_error_listener(Some(&listener)));
    tree.set_at(path!("list", 9), 0);
    tick();
    assert_eq!(errors.borrow().len(), 4);
}

#[test]
fn push_target_replaced_earlier_in_batch() {
    let tree = Tree::from_json(json!({ "list": [] }));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let errors_clone = errors.clone();
    tree.on_error(move |err| errors_clone.borrow_mut().push(err.clone()));

    let list = tree.root()["list"].clone();
    list.set(json!({}));
    list.push(1);
    tick();

    assert_eq!(
        *errors.borrow(),
        vec![TreeError::invalid_push_target(path!("list"), Kind::Map)]
    );
    assert_eq!(tree.to_json(), json!({ "list": {} }));
}
