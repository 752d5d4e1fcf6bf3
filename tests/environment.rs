use std::rc::Rc;

use pretty_assertions::assert_eq;

use rox::environment::{EnvRef, Environment};
use rox::token::Token;
use rox::value::Value;

fn chain(depth: usize) -> Vec<EnvRef> {
    let mut frames: Vec<EnvRef> = vec![Environment::new().into_ref()];
    for _ in 0..depth {
        let inner = Environment::with_enclosing(Rc::clone(frames.last().unwrap())).into_ref();
        frames.push(inner);
    }
    frames
}

#[test]
fn test_define_overwrites_in_same_frame() {
    let mut env = Environment::new();
    env.define("a", Value::from(1.0));
    env.define("a", Value::from("two"));

    assert_eq!(env.get_here("a"), Some(Value::from("two")));
    assert_eq!(env.get_here("b"), None);
}

#[test]
fn test_get_searches_enclosing_frames() {
    let frames = chain(2);
    frames[0].borrow_mut().define("g", Value::from(true));

    let found = frames[2].borrow().get(&Token::identifier("g", 1)).unwrap();
    assert_eq!(found, Value::Bool(true));
}

#[test]
fn test_assign_updates_nearest_binding_only() {
    let frames = chain(1);
    frames[0].borrow_mut().define("x", Value::from(1.0));
    frames[1].borrow_mut().define("x", Value::from(2.0));

    frames[1]
        .borrow_mut()
        .assign(&Token::identifier("x", 1), Value::from(3.0))
        .unwrap();

    assert_eq!(frames[0].borrow().get_here("x"), Some(Value::Number(1.0)));
    assert_eq!(frames[1].borrow().get_here("x"), Some(Value::Number(3.0)));
}

#[test]
fn test_assign_never_creates_a_binding() {
    let mut env = Environment::new();
    let err = env
        .assign(&Token::identifier("ghost", 4), Value::Nil)
        .unwrap_err();

    assert_eq!(err.to_string(), "Undefined variable 'ghost'.\n[line 4]");
    assert_eq!(env.get_here("ghost"), None);
}

#[test]
fn test_get_at_reads_exact_frame() {
    let frames = chain(2);
    frames[0].borrow_mut().define("v", Value::from("outer"));
    frames[2].borrow_mut().define("v", Value::from("inner"));

    let name = Token::identifier("v", 1);
    assert_eq!(
        Environment::get_at(&frames[2], 2, &name).unwrap(),
        Value::from("outer")
    );
    assert_eq!(
        Environment::get_at(&frames[2], 0, &name).unwrap(),
        Value::from("inner")
    );

    // The middle frame has no `v`; a hop count pointing there is a miss.
    assert!(Environment::get_at(&frames[2], 1, &name).is_err());
}

#[test]
fn test_assign_at_writes_exact_frame() {
    let frames = chain(1);
    frames[0].borrow_mut().define("v", Value::from(1.0));

    Environment::assign_at(&frames[1], 1, &Token::identifier("v", 1), Value::from(9.0)).unwrap();

    assert_eq!(frames[0].borrow().get_here("v"), Some(Value::Number(9.0)));
    assert_eq!(frames[1].borrow().get_here("v"), None);
}

#[test]
fn test_ancestor_past_root_is_none() {
    let frames = chain(1);

    assert!(Environment::ancestor(&frames[1], 1).is_some());
    assert!(Environment::ancestor(&frames[1], 2).is_none());
}
