//! Pooled Interpreter Contexts
//!
//! This example backs a machine with a stateful "interpreter" whose globals
//! must not be shared between runs. Each run checks out its own context from
//! a pool, so concurrent runs never see each other's counters.
//!
//! Run with: cargo run --example pooled_interpreter

use statescript::resolver::{
    from_fn, Call, Interpreter, InvocationError, Outcome, Pool, Probe,
};
use statescript::{Builder, CompileError, RunConfig, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

/// Toy interpreter: every function bumps a per-context global counter.
struct Counter {
    globals: HashMap<String, i64>,
}

impl Counter {
    fn load() -> Result<Self, CompileError> {
        Ok(Self {
            globals: HashMap::new(),
        })
    }
}

impl Interpreter for Counter {
    fn probe(&self, name: &str) -> Probe {
        match name {
            "below_limit" | "tick" => Probe::Arity(3),
            _ => Probe::NotFound,
        }
    }

    fn invoke(&mut self, call: &Call<'_>) -> Result<Outcome, InvocationError> {
        let ticks = self.globals.entry("ticks".to_string()).or_insert(0);
        match call.function {
            "below_limit" => Ok(Outcome::replace(*ticks < 5)),
            "tick" => {
                *ticks = ticks.checked_add(1).ok_or_else(|| InvocationError::Failed {
                    function: call.function.to_string(),
                    reason: "tick counter overflow".to_string(),
                })?;
                Ok(Outcome::replace(format!("{} tick {}", call.dst, ticks)))
            }
            other => Err(InvocationError::Failed {
                function: other.to_string(),
                reason: "no such global function".to_string(),
            }),
        }
    }

    fn reset(&mut self) {
        self.globals.clear();
    }
}

fn main() {
    println!("=== Pooled Interpreter Example ===\n");

    let machine = Builder::new(from_fn(|| Pool::new(Counter::load)))
        .state("Loop", "tick", "")
        .transition_if("Loop", "Loop", "below_limit")
        .validate_compile()
        .expect("machine should validate")
        .with_config(RunConfig::new().max_steps(100));
    let machine = Arc::new(machine);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let machine = Arc::clone(&machine);
            thread::spawn(move || (i, machine.run_value("Loop", Value::Null)))
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok((i, Ok(value))) => println!("run {i}: {value}"),
            Ok((i, Err(e))) => println!("run {i} failed: {e}"),
            Err(_) => println!("run thread panicked"),
        }
    }
    println!("idle interpreters: {}", machine.program().idle());

    println!("\n=== Example Complete ===");
}
