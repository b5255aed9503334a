//! End-to-end scenarios from spec §8 (S1-S6) plus the cross-cutting
//! invariants listed alongside them. These exercise the full pipeline
//! (template lexer -> template parser -> expression lexer/parser/evaluator
//! -> renderer) the way an embedder actually calls it, rather than any one
//! component in isolation.

use std::cell::RefCell;
use std::rc::Rc;

use slimrs::{intern, Template, Value, ViewModel};

fn render(src: &str, setup: impl FnOnce(&mut ViewModel)) -> String {
    let tpl = Template::parse(src, &[]).expect("parse").with_doctype(false);
    let vm = Rc::new(RefCell::new(ViewModel::new()));
    setup(&mut vm.borrow_mut());
    tpl.render(vm, &[], None).expect("render")
}

#[test]
fn s1_plain_tags() {
    let out = render("p\n  span Hello\n  span World", |_| {});
    assert_eq!(out, "<p><span>Hello</span><span>World</span></p>");
}

#[test]
fn s2_interpolation_with_escape() {
    let out = render("p Hello #{@a} #{@b}", |vm| {
        vm.set_attr(intern("a"), Value::str("Test"));
        vm.set_attr(intern("b"), Value::str("<b>"));
    });
    assert_eq!(out, "<p>Hello Test &lt;b&gt;</p>");
}

#[test]
fn s3_conditional() {
    let out = render("-if @a == 1\n  p Yes\n-else\n  p No", |vm| {
        vm.set_attr(intern("a"), Value::Number(1.0));
    });
    assert_eq!(out, "<p>Yes</p>");
}

#[test]
fn s4_iteration() {
    let out = render("ul\n  -@xs.each do |x|\n    li= x", |vm| {
        vm.set_attr(
            intern("xs"),
            Value::array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]),
        );
    });
    assert_eq!(out, "<ul><li>1</li><li>2</li><li>3</li></ul>");
}

#[test]
fn s5_dynamic_attributes() {
    let out = render(r#"div.a.b class=@cls Hello"#, |vm| {
        vm.set_attr(intern("cls"), Value::str("hi"));
    });
    assert_eq!(out, r#"<div class="a b hi">Hello</div>"#);
}

#[test]
fn s6_boolean_attribute() {
    let out = render(r#"input(type="checkbox" checked=true disabled=false)"#, |_| {});
    assert_eq!(out, r#"<input type="checkbox" checked/>"#);
}

#[test]
fn doctype_prefix_default_on() {
    let tpl = Template::parse("p Hi", &[]).unwrap();
    let vm = Rc::new(RefCell::new(ViewModel::new()));
    let out = tpl.render(vm, &[], None).unwrap();
    assert_eq!(out, "<!DOCTYPE html>\n<p>Hi</p>");
}

#[test]
fn void_element_with_content_is_a_syntax_error() {
    assert!(Template::parse("img\n  | content", &[]).is_err());
}

#[test]
fn void_element_alone_self_closes() {
    let out = render("img", |_| {});
    assert_eq!(out, "<img/>");
}

#[test]
fn safe_navigation_short_circuits_without_evaluating_args() {
    // `@missing` is Nil; the `&.` call must not evaluate `(@x = 1)`.
    let out = render("-@missing&.foo(@x = 1)\np= @x", |_| {});
    assert_eq!(out, "<p></p>");
}

#[test]
fn symbol_identity_holds_across_spellings() {
    assert_eq!(intern("each"), intern("each"));
    assert_ne!(intern("each"), intern("map"));
}

#[test]
fn hash_merge_right_wins_and_preserves_key_order() {
    let out = render(
        "- h = {a: 1, b: 2}.merge({b: 3, c: 4})\n= h.to_a.map { |pair| pair.join(\":\") }.join(\",\")",
        |_| {},
    );
    assert_eq!(out, "a:1,b:3,c:4");
}

#[test]
fn layout_yields_main_content_and_named_block() {
    let layout = Template::parse("html\n  head\n    = yield :head\n  body\n    = yield", &[])
        .unwrap()
        .with_doctype(false);
    let body = Template::parse("= content_for :head do\n  title Hi\np Body", &[]).unwrap();
    let vm = Rc::new(RefCell::new(ViewModel::new()));
    let out = body.render_layout(&layout, vm, &[], None).unwrap();
    assert_eq!(out, "<html><head><title>Hi</title></head><body><p>Body</p></body></html>");
}
