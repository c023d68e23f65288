//! Functions for linking and calling trigonometric functions in JIT-compiled code.
//!
//! This module provides functionality to:
//! - Register native sine and cosine implementations with the JIT builder
//! - Link those functions into a Cranelift module as imports
//! - Generate Cranelift IR instructions to call them within compiled functions
//!
//! All trigonometric functions operate on 64-bit floating point numbers (f64) and expect
//! arguments in radians.

use cranelift::prelude::FunctionBuilder;
use cranelift_codegen::ir::types::F64;
use cranelift_codegen::ir::{AbiParam, InstBuilder};
use cranelift_jit::JITBuilder;
use cranelift_module::{FuncId, Linkage, Module};

use crate::errors::BuilderError;

const SIN_SYMBOL: &str = "cf_sin";
const COS_SYMBOL: &str = "cf_cos";

extern "C" fn native_sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn native_cos(x: f64) -> f64 {
    x.cos()
}

/// Makes the native sine and cosine implementations resolvable by the JIT linker.
pub fn register_symbols(builder: &mut JITBuilder) {
    builder.symbol(SIN_SYMBOL, native_sin as *const u8);
    builder.symbol(COS_SYMBOL, native_cos as *const u8);
}

fn link_unary(module: &mut dyn Module, name: &str) -> Result<FuncId, BuilderError> {
    // Create signature for f(f64) -> f64
    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(F64));
    sig.returns.push(AbiParam::new(F64));

    module
        .declare_function(name, Linkage::Import, &sig)
        .map_err(|e| BuilderError::DeclarationError(e.to_string()))
}

/// Links the sine function to make it available for JIT compilation.
///
/// # Returns
/// * `Ok(FuncId)` - The function ID that can be used to call sin
/// * `Err(BuilderError)` - If the import cannot be declared
pub fn link_sin(module: &mut dyn Module) -> Result<FuncId, BuilderError> {
    link_unary(module, SIN_SYMBOL)
}

/// Links the cosine function to make it available for JIT compilation.
///
/// # Returns
/// * `Ok(FuncId)` - The function ID that can be used to call cos
/// * `Err(BuilderError)` - If the import cannot be declared
pub fn link_cos(module: &mut dyn Module) -> Result<FuncId, BuilderError> {
    link_unary(module, COS_SYMBOL)
}

/// Generates Cranelift IR instructions to call the sine function.
///
/// # Arguments
/// * `builder` - The Cranelift function builder being used to construct the function
/// * `module` - The Cranelift module containing the function declaration
/// * `func_id` - The function ID returned by link_sin()
/// * `arg` - The Cranelift IR value to pass as the argument to sin (in radians)
pub fn call_sin(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    func_id: FuncId,
    arg: cranelift_codegen::ir::Value,
) -> cranelift_codegen::ir::Value {
    let func = module.declare_func_in_func(func_id, builder.func);
    let call = builder.ins().call(func, &[arg]);
    builder.inst_results(call)[0]
}

/// Generates Cranelift IR instructions to call the cosine function.
///
/// Same contract as [`call_sin`], for the function ID returned by link_cos().
pub fn call_cos(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    func_id: FuncId,
    arg: cranelift_codegen::ir::Value,
) -> cranelift_codegen::ir::Value {
    let func = module.declare_func_in_func(func_id, builder.func);
    let call = builder.ins().call(func, &[arg]);
    builder.inst_results(call)[0]
}
