mod common;

use pretty_assertions::assert_eq;

use rox::runner::{self, run_source};
use rox::value::Value;

use common::{capturing_interpreter, lines, run_err, run_ok};

// ============================================================================
// Scoping and closures
// ============================================================================

#[test]
fn test_block_shadowing_restores_outer_binding() {
    let output = run_ok("var x = 1; { var x = 2; print x; } print x;");
    assert_eq!(output, lines(&["2", "1"]));
}

#[test]
fn test_closures_capture_defining_scope() {
    let source = r#"
        fun makeCounter() {
          var count = 0;
          fun increment() {
            count = count + 1;
            return count;
          }
          return increment;
        }

        var a = makeCounter();
        var b = makeCounter();
        print a();
        print a();
        print b();
        print a();
    "#;

    assert_eq!(run_ok(source), lines(&["1", "2", "1", "3"]));
}

#[test]
fn test_resolution_is_static_not_dynamic() {
    // The closure keeps seeing the global `a` even after a local `a` is
    // declared in the same block.
    let source = r#"
        var a = "global";
        {
          fun showA() { print a; }
          showA();
          var a = "block";
          showA();
        }
    "#;

    assert_eq!(run_ok(source), lines(&["global", "global"]));
}

#[test]
fn test_assignment_reaches_enclosing_scopes() {
    let source = r#"
        var total = 0;
        for (var i = 1; i <= 4; i = i + 1) {
          total = total + i;
        }
        print total;
    "#;

    assert_eq!(run_ok(source), lines(&["10"]));
}

// ============================================================================
// Values, arithmetic, equality
// ============================================================================

#[test]
fn test_arithmetic_and_concatenation() {
    let output = run_ok(
        r#"
        print 1 + 2;
        print "a" + "b";
        print 7 / 2;
        print -(3 * 2);
        print 10 - 4 >= 6;
    "#,
    );

    assert_eq!(output, lines(&["3", "ab", "3.5", "-6", "true"]));
}

#[test]
fn test_equality_across_kinds() {
    let output = run_ok(
        r#"
        print "3" == 3;
        print nil == nil;
        print nil == false;
        print 1 == 1;
        print "a" != "a";
    "#,
    );

    assert_eq!(output, lines(&["false", "true", "false", "true", "false"]));
}

#[test]
fn test_truthiness() {
    let output = run_ok(
        r#"
        if (0) print "zero is truthy";
        if ("") print "empty string is truthy";
        if (nil) print "unreachable"; else print "nil is falsy";
        print !false;
    "#,
    );

    assert_eq!(
        output,
        lines(&["zero is truthy", "empty string is truthy", "nil is falsy", "true"])
    );
}

#[test]
fn test_logical_operators_return_deciding_operand() {
    let output = run_ok(
        r#"
        print "hi" or 2;
        print nil or "yes";
        print nil and boom();
        print 1 and 2;
    "#,
    );

    assert_eq!(output, lines(&["hi", "yes", "nil", "2"]));
}

#[test]
fn test_division_by_zero_follows_ieee() {
    let (mut interpreter, _) = capturing_interpreter();
    let value = runner::evaluate_source(&mut interpreter, b"1 / 0").expect("no runtime error");

    assert!(matches!(value, Value::Number(n) if n.is_infinite()));
}

#[test]
fn test_non_finite_and_huge_numbers_print_by_name_or_exponent() {
    let output = run_ok(
        r#"
        print 1 / 0;
        print -1 / 0;
        print 0 / 0;
        print 1000000000000000000000;
        print 15000000000000000000000;
        print 123456789;
    "#,
    );

    assert_eq!(
        output,
        lines(&["Infinity", "-Infinity", "NaN", "1.0E21", "1.5E22", "123456789"])
    );
}

#[test]
fn test_stringification() {
    let output = run_ok(
        r#"
        fun f() {}
        class C {}
        print f;
        print C;
        print C();
        print clock;
        print 2.50;
    "#,
    );

    assert_eq!(
        output,
        lines(&["<fn f>", "C", "C instance", "<native fn>", "2.5"])
    );
}

// ============================================================================
// Runtime errors
// ============================================================================

#[test]
fn test_adding_number_and_string_fails() {
    let (output, errors) = run_err("print 1;\nprint 1 + \"a\";\nprint 2;");

    assert_eq!(output, lines(&["1"]));
    assert_eq!(
        errors,
        vec!["Operands must be two numbers or two strings.\n[line 2]"]
    );
}

#[test]
fn test_non_number_operands() {
    let (_, errors) = run_err("print -\"x\";");
    assert_eq!(errors, vec!["Operand must be a number.\n[line 1]"]);

    let (_, errors) = run_err("print 1 < \"2\";");
    assert_eq!(errors, vec!["Operands must be numbers.\n[line 1]"]);
}

#[test]
fn test_calling_non_callable() {
    let (_, errors) = run_err("\"not a function\"();");
    assert_eq!(errors, vec!["Can only call functions and classes.\n[line 1]"]);
}

#[test]
fn test_arity_mismatch() {
    let (_, errors) = run_err("fun f(a, b) {}\nf(1);");
    assert_eq!(errors, vec!["Expected 2 arguments but got 1.\n[line 2]"]);

    let (_, errors) = run_err("class P { init(x) {} }\nP();");
    assert_eq!(errors, vec!["Expected 1 arguments but got 0.\n[line 2]"]);
}

#[test]
fn test_undefined_variable() {
    let (_, errors) = run_err("print missing;");
    assert_eq!(errors, vec!["Undefined variable 'missing'.\n[line 1]"]);

    let (_, errors) = run_err("missing = 1;");
    assert_eq!(errors, vec!["Undefined variable 'missing'.\n[line 1]"]);
}

#[test]
fn test_property_access_on_non_instance() {
    let (_, errors) = run_err("var s = \"str\";\nprint s.length;");
    assert_eq!(errors, vec!["Only instances have properties.\n[line 2]"]);

    let (_, errors) = run_err("var n = 1;\nn.field = 2;");
    assert_eq!(errors, vec!["Only instances have fields.\n[line 2]"]);
}

#[test]
fn test_undefined_property() {
    let (_, errors) = run_err("class A {}\nprint A().nope;");
    assert_eq!(errors, vec!["Undefined property 'nope'.\n[line 2]"]);
}

#[test]
fn test_superclass_must_be_a_class() {
    let (_, errors) = run_err("var NotAClass = 1;\nclass B < NotAClass {}");
    assert_eq!(errors, vec!["Superclass must be a class.\n[line 2]"]);
}

#[test]
fn test_runtime_error_does_not_poison_the_interpreter() {
    let (mut interpreter, buffer) = capturing_interpreter();

    run_source(&mut interpreter, b"var x = 1; { var y = 2; y(); }")
        .expect_err("calling a number fails");
    run_source(&mut interpreter, b"print x; { print y; }").expect_err("y was block-local");
    run_source(&mut interpreter, b"x = x + 1; print x;").expect("globals still usable");

    assert_eq!(buffer.contents(), lines(&["1", "2"]));
}

#[test]
fn test_static_errors_prevent_execution() {
    let (output, errors) = run_err("print \"before\";\n{ var a = a; }");

    assert_eq!(output, "");
    assert_eq!(
        errors,
        vec!["[line 2] Error at 'a': Cannot read local variable in its own initializer."]
    );
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursive_fibonacci() {
    let source = r#"
        fun fib(n) {
          if (n < 2) return n;
          return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;

    assert_eq!(run_ok(source), lines(&["55"]));
}

#[test]
fn test_return_unwinds_through_loops_and_blocks() {
    let source = r#"
        fun firstOver(limit) {
          var i = 0;
          while (true) {
            {
              if (i > limit) return i;
            }
            i = i + 1;
          }
        }
        print firstOver(3);
        fun nothing() { return; }
        print nothing();
    "#;

    assert_eq!(run_ok(source), lines(&["4", "nil"]));
}

#[test]
fn test_native_functions() {
    let (mut interpreter, buffer) = capturing_interpreter();
    interpreter.define_native("double", 1, |args| match args {
        [Value::Number(n)] => Ok(Value::from(n * 2.0)),
        _ => Err("expected a number".to_string()),
    });

    run_source(&mut interpreter, b"print double(21); print clock() > 0;").expect("natives run");
    assert_eq!(buffer.contents(), lines(&["42", "true"]));

    let errors =
        run_source(&mut interpreter, b"\n\ndouble(\"x\");").expect_err("native fails");
    assert_eq!(
        errors[0].to_string(),
        "Native function 'double' failed: expected a number\n[line 3]"
    );
    assert_eq!(errors[0].exit_code(), 70);
}

#[test]
fn test_closures_from_earlier_runs_keep_their_resolution() {
    let (mut interpreter, buffer) = capturing_interpreter();

    run_source(
        &mut interpreter,
        b"fun counter() { var n = 0; fun next() { n = n + 1; return n; } return next; }",
    )
    .expect("declaration runs");
    run_source(&mut interpreter, b"var tick = counter(); tick();").expect("first call");
    run_source(&mut interpreter, b"print tick();").expect("second call");

    assert_eq!(buffer.contents(), lines(&["2"]));
}

// ============================================================================
// Classes
// ============================================================================

#[test]
fn test_init_stores_fields() {
    let source = r#"
        class Box {
          init(x) { this.x = x; }
          get() { return this.x; }
        }
        var b = Box(42);
        print b.get();
        print b.x;
    "#;

    assert_eq!(run_ok(source), lines(&["42", "42"]));
}

#[test]
fn test_instances_do_not_share_fields() {
    let source = r#"
        class Counter {
          init() { this.n = 0; }
          bump() { this.n = this.n + 1; return this.n; }
        }
        var a = Counter();
        var b = Counter();
        var bumpA = a.bump;
        bumpA();
        bumpA();
        print a.n;
        print b.bump();
        print a.n;
    "#;

    assert_eq!(run_ok(source), lines(&["2", "1", "2"]));
}

#[test]
fn test_fields_shadow_methods() {
    let source = r#"
        class A { m() { return "method"; } }
        var a = A();
        print a.m();
        a.m = "field";
        print a.m;
    "#;

    assert_eq!(run_ok(source), lines(&["method", "field"]));
}

#[test]
fn test_initializer_returns_instance() {
    let source = r#"
        class A {
          init() { this.v = 1; return; }
        }
        var a = A();
        print a.init();
        print a.init() == a;
    "#;

    assert_eq!(run_ok(source), lines(&["A instance", "true"]));
}

#[test]
fn test_method_override_and_super_dispatch() {
    let source = r#"
        class Animal {
          speak() { return "..." ; }
          name() { return "animal"; }
        }
        class Dog < Animal {
          speak() { return "woof and " + super.speak(); }
        }
        var d = Dog();
        print d.speak();
        print d.name();
    "#;

    assert_eq!(run_ok(source), lines(&["woof and ...", "animal"]));
}

#[test]
fn test_super_binds_current_instance() {
    let source = r#"
        class A {
          describe() { return "I am " + this.label; }
        }
        class B < A {
          init(label) { this.label = label; }
          describe() { return super.describe() + "!"; }
        }
        class C < B {
          init() { super.init("c"); }
        }
        print C().describe();
    "#;

    assert_eq!(run_ok(source), lines(&["I am c!"]));
}

#[test]
fn test_methods_can_name_their_class() {
    let source = r#"
        class Node {
          init(depth) { this.depth = depth; }
          child() { return Node(this.depth + 1); }
        }
        print Node(0).child().child().depth;
    "#;

    assert_eq!(run_ok(source), lines(&["2"]));
}

#[test]
fn test_undefined_super_method() {
    let (_, errors) = run_err(
        "class A {}\nclass B < A { m() { return super.missing(); } }\nB().m();",
    );

    assert_eq!(errors, vec!["Undefined property 'missing'.\n[line 2]"]);
}
