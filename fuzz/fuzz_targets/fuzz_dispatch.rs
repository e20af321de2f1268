//! Fuzz target: `dispatch_bytes`
//!
//! Feeds arbitrary bytes to the dispatcher against a small registry and
//! checks the reply invariants: every reply is a JSON-RPC 2.0 envelope
//! carrying exactly one of `result` / `error` (or neither, for a `None`
//! method), and nothing without an `id` member is answered unless it
//! failed before an id could be read.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use memberrpc::rpc::params::require_i64;
use memberrpc::rpc::registry::{Handler, MethodResult, Registry};
use memberrpc::rpc::dispatch_bytes;
use serde_json::Value;

#[derive(Default)]
struct Ctx {
    total: i64,
}

fn add(ctx: &mut Ctx, params: &Value) -> MethodResult<i64> {
    ctx.total = ctx.total.wrapping_add(require_i64(params, "value")?);
    Ok(ctx.total)
}

fn clear(ctx: &mut Ctx, _: &Value) -> MethodResult<()> {
    ctx.total = 0;
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let mut registry = Registry::with_capacity(2);
    let _ = registry.register("add", Handler::Int(add));
    let _ = registry.register("clear", Handler::None(clear));

    let mut ctx = Ctx::default();
    let Some(response) = dispatch_bytes(&registry, &mut ctx, data) else {
        return;
    };

    assert_eq!(response.jsonrpc, "2.0");
    assert!(!(response.result.is_some() && response.error.is_some()));
    assert!(response.id.is_some(), "replies always carry an id member");
    assert!(serde_json::to_vec(&response).is_ok());
});
