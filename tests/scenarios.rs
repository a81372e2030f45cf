//! End-to-end runs of compiled machines.

use statescript::resolver::{
    from_fn, Call, Interpreter, InvocationError, NativeModule, Outcome, Pool, Probe,
};
use statescript::{Builder, Machine, RunConfig, RunError, Value};
use std::sync::{Arc, Mutex};
use std::thread;

fn truthiness_machine() -> Machine<NativeModule> {
    let module = NativeModule::new()
        .function("truthy", |_, _, v| Outcome::replace(v.is_truthy()))
        .function("falsy", |_, _, v| Outcome::replace(!v.is_truthy()));

    Builder::new(module)
        .state("S", "", "")
        .state("T", "", "")
        .state("F", "", "")
        .transition_if("S", "T", "truthy")
        .transition_if("S", "F", "falsy")
        .validate_compile()
        .unwrap()
}

/// Recognizes `digit+ ('.' digit+)?`, consuming one character per entry.
fn decimals_machine(log: Arc<Mutex<Vec<String>>>) -> Machine<NativeModule> {
    fn first(v: &Value) -> Option<char> {
        v.as_str().and_then(|s| s.chars().next())
    }

    let module = NativeModule::new()
        .function("is_digit", |_, _, v| {
            Outcome::replace(first(v).is_some_and(|c| c.is_ascii_digit()))
        })
        .function("is_dot", |_, _, v| Outcome::replace(first(v) == Some('.')))
        .function("is_eol", |_, _, v| {
            Outcome::replace(v.as_str().is_some_and(str::is_empty))
        })
        .function("enter", move |src, dst, v| {
            let s = v.as_str().unwrap_or_default();
            log.lock().unwrap().push(format!("{src} -> {dst}: {s}"));
            Outcome::replace(s.chars().skip(1).collect::<String>())
        })
        .function("enter_end", |_, _, _| Outcome::replace("valid number"))
        .function("enter_error", |_, _, v| {
            Outcome::replace(format!("invalid number: {}", v.as_str().unwrap_or_default()))
        });

    Builder::new(module)
        .state("S", "enter", "")
        .state("N", "enter", "")
        .state("P", "enter", "")
        .state("F", "enter", "")
        .state("E", "enter_end", "")
        .state("X", "enter_error", "")
        .transition_if("S", "E", "is_eol")
        .transition_if("S", "N", "is_digit")
        .transition_always("S", "X")
        .transition_if("N", "E", "is_eol")
        .transition_if("N", "N", "is_digit")
        .transition_if("N", "P", "is_dot")
        .transition_always("N", "X")
        .transition_if("P", "F", "is_digit")
        .transition_always("P", "X")
        .transition_if("F", "E", "is_eol")
        .transition_if("F", "F", "is_digit")
        .transition_always("F", "X")
        .validate_compile()
        .unwrap()
}

#[test]
fn truthy_value_takes_first_branch() {
    let machine = truthiness_machine();

    let trace = machine.run_traced("S", &1).unwrap();
    assert_eq!(trace.state, "T");
    assert_eq!(trace.value, Value::Int(1));

    let trace = machine.run_traced("S", "foobar").unwrap();
    assert_eq!(trace.state, "T");
}

#[test]
fn falsy_values_take_second_branch() {
    let machine = truthiness_machine();

    assert_eq!(machine.run_traced("S", "").unwrap().state, "F");
    assert_eq!(machine.run_traced("S", &0).unwrap().state, "F");
    assert_eq!(machine.run_traced("S", &Vec::<i32>::new()).unwrap().state, "F");
    assert_eq!(
        machine.run_value("S", Value::Float(f64::NAN)).unwrap().to_string(),
        "NaN"
    );
}

#[test]
fn decimals_accepts_valid_number() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let machine = decimals_machine(Arc::clone(&log));

    let trace = machine.run_traced("S", "123.456").unwrap();

    assert_eq!(trace.state, "E");
    assert_eq!(trace.value, Value::from("valid number"));
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "S -> N: 123.456",
            "N -> N: 23.456",
            "N -> N: 3.456",
            "N -> P: .456",
            "P -> F: 456",
            "F -> F: 56",
            "F -> F: 6",
        ]
    );
}

#[test]
fn decimals_rejects_second_decimal_point() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let machine = decimals_machine(Arc::clone(&log));

    let trace = machine.run_traced("S", "12.34.56").unwrap();

    assert_eq!(trace.state, "X");
    assert_eq!(trace.value, Value::from("invalid number: .56"));
    assert_eq!(
        trace.history.path(),
        vec!["S", "N", "N", "P", "F", "F", "X"]
    );
}

#[test]
fn action_domain_error_skips_entry() {
    let entered = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&entered);
    let module = NativeModule::new()
        .function("err1", |_, _, _| Outcome::fail("an error occurred"))
        .function("enter", move |_, _, _| {
            *flag.lock().unwrap() = true;
            Outcome::Unchanged
        });

    let machine = Builder::new(module)
        .state("S", "", "")
        .state("T", "enter", "")
        .transition("S", "T", "", "err1")
        .validate_compile()
        .unwrap();

    let err = machine.run("S", &123).unwrap_err();

    assert_eq!(err.to_string(), "an error occurred");
    assert!(matches!(err, RunError::Domain { ref src, ref dst, .. } if src == "S" && dst == "T"));
    assert!(!*entered.lock().unwrap());
}

#[test]
fn action_without_return_keeps_value() {
    let module = NativeModule::new().function("fn1", |_, _, _| Outcome::Unchanged);
    let machine = Builder::new(module)
        .state("s1", "", "")
        .state("s2", "", "")
        .transition("s1", "s2", "", "fn1")
        .compile()
        .unwrap();

    assert_eq!(machine.run("s1", &123).unwrap(), Value::Int(123));
}

#[test]
fn action_return_replaces_value() {
    let module = NativeModule::new().function("fn2", |_, _, _| Outcome::replace("foobar"));
    let machine = Builder::new(module)
        .state("s1", "", "")
        .state("s2", "", "")
        .transition("s1", "s2", "", "fn2")
        .compile()
        .unwrap();

    assert_eq!(machine.run("s1", &123).unwrap(), Value::from("foobar"));
}

#[test]
fn unconvertible_input_is_rejected() {
    struct Opaque;

    impl serde::Serialize for Opaque {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot represent handle"))
        }
    }

    let err = truthiness_machine().run("S", &Opaque).unwrap_err();
    assert!(matches!(err, RunError::ValueConversion(_)));
}

#[test]
fn hooks_see_structured_values() {
    #[derive(serde::Serialize)]
    struct Order {
        total: i64,
    }

    let module = NativeModule::new()
        .function("large", |_, _, v| {
            let total = match v {
                Value::Map(entries) => entries.get("total").and_then(Value::as_i64),
                _ => None,
            };
            Outcome::replace(total.is_some_and(|t| t > 100))
        })
        .function("approve", |_, _, _| Outcome::replace("needs approval"));

    let machine = Builder::new(module)
        .state("New", "", "")
        .state("Review", "approve", "")
        .transition_if("New", "Review", "large")
        .validate_compile()
        .unwrap();

    assert_eq!(
        machine.run("New", &Order { total: 250 }).unwrap(),
        Value::from("needs approval")
    );
    let small = machine.run("New", &Order { total: 5 }).unwrap();
    assert_eq!(small.deserialize_into::<serde_json::Value>().unwrap()["total"], 5);
}

#[tokio::test]
async fn compiled_machine_serves_concurrent_runs() {
    let machine = Arc::new(decimals_machine(Arc::new(Mutex::new(Vec::new()))));

    let mut handles = Vec::new();
    for i in 0..16 {
        let machine = Arc::clone(&machine);
        handles.push(tokio::task::spawn_blocking(move || {
            let input = if i % 2 == 0 { "123.456" } else { "12.34.56" };
            machine.run("S", input)
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let value = handle.await.unwrap().unwrap();
        let expected = if i % 2 == 0 {
            "valid number"
        } else {
            "invalid number: .56"
        };
        assert_eq!(value, Value::from(expected));
    }
}

/// Interpreter with a context-global tick counter.
#[derive(Default)]
struct Ticker {
    ticks: i64,
}

impl Interpreter for Ticker {
    fn probe(&self, name: &str) -> Probe {
        match name {
            "below_five" | "tick" | "explode" => Probe::Arity(3),
            _ => Probe::NotFound,
        }
    }

    fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError> {
        match call.function {
            "below_five" => Ok(Outcome::replace(self.ticks < 5)),
            "tick" => {
                self.ticks += 1;
                Ok(Outcome::replace(self.ticks))
            }
            "explode" => {
                self.ticks = 100;
                panic!("interpreter bug");
            }
            other => Err(InvocationError::NotFound(other.to_string())),
        }
    }

    fn reset(&mut self) {
        self.ticks = 0;
    }
}

fn ticker_machine() -> Machine<Pool<Ticker>> {
    Builder::new(from_fn(|| Pool::new(|| Ok(Ticker::default()))))
        .state("Loop", "tick", "")
        .transition_if("Loop", "Loop", "below_five")
        .validate_compile()
        .unwrap()
        .with_config(RunConfig::new().max_steps(50))
}

#[test]
fn pooled_runs_each_start_from_a_fresh_context() {
    let machine = Arc::new(ticker_machine());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let machine = Arc::clone(&machine);
            thread::spawn(move || {
                (0..10)
                    .map(|_| machine.run_value("Loop", Value::Null))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        for result in handle.join().unwrap() {
            assert_eq!(result.unwrap(), Value::Int(5));
        }
    }
    assert!(machine.program().idle() >= 1);
}

#[test]
fn pooled_interpreter_panic_is_contained() {
    let machine = Builder::new(from_fn(|| Pool::new(|| Ok(Ticker::default()))))
        .state("S", "", "")
        .state("Crash", "explode", "")
        .state("Loop", "tick", "")
        .transition_always("S", "Crash")
        .transition_if("Loop", "Loop", "below_five")
        .validate_compile()
        .unwrap();

    let err = machine.run_value("S", Value::Null).unwrap_err();
    assert_eq!(
        err,
        RunError::Invocation(InvocationError::Panicked {
            function: "explode".into()
        })
    );
    assert_eq!(machine.program().idle(), 0);

    assert_eq!(machine.run_value("Loop", Value::Null).unwrap(), Value::Int(5));
}
