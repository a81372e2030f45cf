//! Decimal Number Recognizer
//!
//! This example walks a string one character at a time, accepting
//! `digit+ ('.' digit+)?`.
//!
//! Key concepts:
//! - Entry hooks that consume input by returning a shorter value
//! - Conditions evaluated in declaration order, with an unconditional fallback
//! - Tracing the path a run took
//!
//! Run with: cargo run --example decimals

use statescript::resolver::{NativeModule, Outcome};
use statescript::{Builder, Value};

fn first(v: &Value) -> Option<char> {
    v.as_str().and_then(|s| s.chars().next())
}

fn main() {
    println!("=== Decimal Recognizer Example ===\n");

    let module = NativeModule::new()
        .function("is_digit", |_, _, v| {
            Outcome::replace(first(v).is_some_and(|c| c.is_ascii_digit()))
        })
        .function("is_dot", |_, _, v| Outcome::replace(first(v) == Some('.')))
        .function("is_eol", |_, _, v| {
            Outcome::replace(v.as_str().is_some_and(str::is_empty))
        })
        .function("enter", |src, dst, v| {
            let s = v.as_str().unwrap_or_default();
            println!("{src} -> {dst}: {s}");
            Outcome::replace(s.chars().skip(1).collect::<String>())
        })
        .function("enter_end", |_, _, _| Outcome::replace("valid number"))
        .function("enter_error", |_, _, v| {
            Outcome::replace(format!("invalid number: {}", v.as_str().unwrap_or_default()))
        });

    let machine = Builder::new(module)
        .state("S", "enter", "") // start
        .state("N", "enter", "") // whole numbers
        .state("P", "enter", "") // decimal point
        .state("F", "enter", "") // fractional part
        .state("E", "enter_end", "") // end
        .state("X", "enter_error", "") // error
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
        .expect("decimal machine should validate");

    for input in ["123.456", "12.34.56"] {
        match machine.run_traced("S", input) {
            Ok(trace) => {
                println!("{}", trace.value);
                println!("path: {}\n", trace.history.path().join(" -> "));
            }
            Err(e) => println!("error: {e}\n"),
        }
    }

    println!("=== Example Complete ===");
}
