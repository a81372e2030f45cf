//! Truthiness Branching
//!
//! This example shows how condition results are interpreted and in which
//! order exit, transition and entry hooks run.
//!
//! Run with: cargo run --example truthiness

use statescript::resolver::{NativeModule, Outcome};
use statescript::Builder;

fn main() {
    println!("=== Truthiness Example ===\n");

    let module = NativeModule::new()
        .function("truthy", |_, _, v| Outcome::replace(v.is_truthy()))
        .function("falsy", |_, _, v| Outcome::replace(!v.is_truthy()))
        .function("action", |src, dst, v| {
            println!("{src} -> {dst}: {v}");
            Outcome::Unchanged
        })
        .function("enter", |_, dst, v| {
            println!("{dst} ->: {v}");
            Outcome::Unchanged
        })
        .function("leave", |src, _, v| {
            println!("-> {src}: {v}");
            Outcome::Unchanged
        });

    let machine = Builder::new(module)
        .state("S", "enter", "leave")
        .state("T", "enter", "leave")
        .state("F", "enter", "leave")
        .transition("S", "T", "truthy", "action")
        .transition("S", "F", "falsy", "action")
        .validate_compile()
        .expect("machine should validate");

    let inputs: Vec<serde_json::Value> = vec![
        serde_json::json!(1),
        serde_json::json!("foobar"),
        serde_json::json!(""),
        serde_json::json!([]),
    ];
    for input in &inputs {
        if let Err(e) = machine.run("S", input) {
            println!("error: {e}");
        }
    }

    println!("\n=== Example Complete ===");
}
