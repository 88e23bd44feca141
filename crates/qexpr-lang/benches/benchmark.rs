use qexpr_lang::{Callable, Compiler, Node, Parameter, Shared, Type, Value, build};

fn main() {
    divan::main();
}

/// `|n, f| { f = |k| if k <= 1 { k } else { f(k - 1) + f(k - 2) }; f(n) }`
fn fibonacci() -> Shared<Node> {
    let n = Parameter::new("n", Type::I32);
    let f = Parameter::new("f", Type::function(vec![Type::I32], Type::I32));
    let k = Parameter::new("k", Type::I32);
    let call = |offset: i32| {
        build::invoke(
            build::param(&f),
            vec![build::subtract(build::param(&k), build::constant(offset))],
        )
    };
    let body = build::condition(
        build::less_than_or_equal(build::param(&k), build::constant(1)),
        build::param(&k),
        build::add(call(1), call(2)),
    );
    let fib = build::lambda(vec![Shared::clone(&k)], body);
    build::lambda(
        vec![Shared::clone(&n), Shared::clone(&f)],
        build::block(vec![
            build::assign(&f, fib),
            build::invoke(build::param(&f), vec![build::param(&n)]),
        ]),
    )
}

fn make_counter() -> Shared<Node> {
    let x = Parameter::new("x", Type::I32);
    let increment = build::lambda(
        vec![],
        build::assign(&x, build::add(build::param(&x), build::constant(1))),
    );
    build::lambda(vec![x], increment)
}

#[divan::bench]
fn compile_fibonacci(bencher: divan::Bencher) {
    let tree = fibonacci();
    bencher.bench(|| Compiler::default().compile(&tree).unwrap());
}

#[divan::bench(args = [10, 20])]
fn eval_fibonacci(bencher: divan::Bencher, n: i32) {
    let callable: Callable = qexpr_lang::compile(&fibonacci()).unwrap();
    bencher.bench(|| callable.invoke(&[Value::I32(n), Value::Null]).unwrap());
}

#[divan::bench(args = [1_000])]
fn eval_counter_closure(bencher: divan::Bencher, n: usize) {
    let root = qexpr_lang::compile(&make_counter()).unwrap();
    bencher.bench(|| {
        let counter = root.invoke(&[Value::I32(0)]).unwrap();
        let counter = counter.as_function().unwrap();
        for _ in 0..n {
            counter.invoke(&[]).unwrap();
        }
        counter.invoke(&[]).unwrap()
    });
}

#[divan::bench]
fn eval_quote(bencher: divan::Bencher) {
    let x = Parameter::new("x", Type::I32);
    let body = build::quote(build::multiply(build::add(build::param(&x), build::constant(1)), build::param(&x)));
    let callable = qexpr_lang::compile(&build::lambda(vec![x], body)).unwrap();
    bencher.bench(|| callable.invoke(&[Value::I32(7)]).unwrap());
}
