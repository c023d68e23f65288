//! This module provides functionality for JIT compilation of the residual expressions.
//! It uses Cranelift as the backend compiler to generate native machine code.
//!
//! The main entry point is `build_combined_function()`, which compiles a list of
//! expressions into one native function writing every result into an output buffer.

use std::sync::Arc;

use crate::{
    errors::{BuilderError, EquationError},
    expr::{Expr, TrigFuncs},
    operators::trigonometric,
    types::CombinedJITFunction,
};
use cranelift::prelude::*;
use cranelift_codegen::{ir::immediates::Offset32, Context};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{Linkage, Module};
use isa::TargetIsa;

/// Finalized machine code together with the module that owns it.
///
/// The module is only kept to release the code memory once the last handle
/// to the compiled function is dropped.
struct CompiledCode {
    module: Option<JITModule>,
    code: *const u8,
}

// SAFETY: after finalization the module is never mutated again and the code
// pointer refers to immutable, executable memory.
unsafe impl Send for CompiledCode {}
unsafe impl Sync for CompiledCode {}

impl Drop for CompiledCode {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            // SAFETY: the only pointer into this module lives in `self` and is
            // dropped together with it.
            unsafe { module.free_memory() };
        }
    }
}

/// Creates an Instruction Set Architecture (ISA) target for code generation.
///
/// This function detects the host machine architecture and configures appropriate
/// compilation flags for optimal code generation.
///
/// # Returns
/// An Arc-wrapped TargetIsa configured for the host machine.
///
/// # Errors
/// Returns a BuilderError if:
/// - The host machine architecture is not supported
/// - Code generation configuration fails
pub(crate) fn create_isa() -> Result<Arc<dyn TargetIsa>, BuilderError> {
    let mut flag_builder = settings::builder();

    // Get target triple to detect architecture
    let target_triple = target_lexicon::Triple::host();
    let is_x86 = matches!(
        target_triple.architecture,
        target_lexicon::Architecture::X86_64
    );

    flag_builder.set(
        "use_colocated_libcalls",
        if is_x86 { "true" } else { "false" },
    )?;
    // The JIT module rejects position-independent code on every architecture
    flag_builder.set("is_pic", "false")?;
    flag_builder.set("opt_level", "speed")?;

    #[cfg(debug_assertions)]
    flag_builder.set("enable_verifier", "true")?;
    #[cfg(not(debug_assertions))]
    flag_builder.set("enable_verifier", "false")?;

    let isa_builder = cranelift_native::builder()
        .map_err(|msg| BuilderError::HostMachineNotSupported(msg.to_string()))?;

    isa_builder
        .finish(settings::Flags::new(flag_builder))
        .map_err(BuilderError::CodegenError)
}

/// Creates a new JIT module with the trigonometric functions registered.
pub(crate) fn create_module(isa: Arc<dyn TargetIsa>) -> JITModule {
    let mut builder = JITBuilder::with_isa(isa, cranelift_module::default_libcall_names());
    trigonometric::register_symbols(&mut builder);
    JITModule::new(builder)
}

/// Builds a JIT-compiled function that evaluates multiple expressions together.
///
/// The generated code evaluates every expression in a single call and stores the
/// results directly in an output buffer, in the order of `exprs`. Variables are read
/// from the input buffer at the index carried by their `VarRef`.
///
/// # Arguments
/// * `exprs` - Expression ASTs to compile together
///
/// # Returns
/// A thread-safe function that:
/// - Takes a slice of input values
/// - Takes a mutable slice for results
/// - Evaluates all expressions
/// - Stores results directly in the output slice
///
/// # Errors
/// Returns an EquationError if compilation fails
///
/// # Safety of the returned closure
/// Callers must pass an input slice covering every variable index and an output slice
/// of `exprs.len()` elements. `EquationSystem` checks both before every call.
pub fn build_combined_function(exprs: &[Expr]) -> Result<CombinedJITFunction, EquationError> {
    // Set up JIT compilation context
    let mut builder_context = FunctionBuilderContext::new();
    let mut codegen_context = Context::new();
    let isa = create_isa()?;
    let mut module = create_module(isa);

    let trig = TrigFuncs {
        sin: trigonometric::link_sin(&mut module)?,
        cos: trigonometric::link_cos(&mut module)?,
    };

    // Create function signature: fn(input_ptr: *const f64, output_ptr: *mut f64)
    let pointer_type = module.target_config().pointer_type();
    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(pointer_type)); // input_ptr
    sig.params.push(AbiParam::new(pointer_type)); // output_ptr

    let func_id = module
        .declare_function("combined", Linkage::Export, &sig)
        .map_err(|msg| BuilderError::DeclarationError(msg.to_string()))?;

    codegen_context.func.signature = sig;
    let func = &mut codegen_context.func;
    let mut builder = FunctionBuilder::new(func, &mut builder_context);

    // Create entry block
    let entry_block = builder.create_block();
    builder.append_block_params_for_function_params(entry_block);
    builder.switch_to_block(entry_block);
    builder.seal_block(entry_block);

    let input_ptr = builder.block_params(entry_block)[0];
    let output_ptr = builder.block_params(entry_block)[1];

    let results: Vec<_> = exprs
        .iter()
        .map(|expr| expr.codegen(&mut builder, &mut module, input_ptr, trig))
        .collect::<Result<_, _>>()?;

    // Store results in output array
    for (i, result) in results.iter().enumerate() {
        let offset = i as i32 * 8;
        builder.ins().store(
            MemFlags::trusted(),
            *result,
            output_ptr,
            Offset32::new(offset),
        );
    }

    // Return void since we wrote directly to output buffer
    builder.ins().return_(&[]);
    builder.finalize();

    module
        .define_function(func_id, &mut codegen_context)
        .map_err(|msg| BuilderError::FunctionError(msg.to_string()))?;
    module.clear_context(&mut codegen_context);
    module
        .finalize_definitions()
        .map_err(BuilderError::ModuleError)?;

    let code = module.get_finalized_function(func_id);
    let compiled = Arc::new(CompiledCode {
        module: Some(module),
        code,
    });

    let wrapper = move |inputs: &[f64], results: &mut [f64]| {
        // SAFETY: the function was compiled with signature
        // fn(*const f64, *mut f64) and `compiled` keeps its memory alive.
        unsafe {
            let f: extern "C" fn(*const f64, *mut f64) = std::mem::transmute(compiled.code);
            f(inputs.as_ptr(), results.as_mut_ptr());
        }
    };

    Ok(Arc::new(wrapper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isa_is_not_position_independent() -> Result<(), Box<dyn std::error::Error>> {
        let isa = create_isa()?;
        assert!(!isa.flags().is_pic());
        // The JIT module accepts the ISA
        let _module = create_module(isa);
        Ok(())
    }

    #[test]
    fn test_combined_function_writes_every_output() -> Result<(), Box<dyn std::error::Error>> {
        // [F * cos(theta), F * sin(theta), 2.5]
        let f = Box::new(Expr::var("F", 0));
        let theta = Box::new(Expr::var("theta", 1));
        let exprs = vec![
            Expr::Mul(f.clone(), Box::new(Expr::Cos(theta.clone()))),
            Expr::Mul(f, Box::new(Expr::Sin(theta))),
            Expr::Const(2.5),
        ];

        let func = build_combined_function(&exprs)?;
        let mut out = [0.0; 3];
        func(&[2.0, std::f64::consts::FRAC_PI_2], &mut out);

        assert!(out[0].abs() < 1e-12);
        assert!((out[1] - 2.0).abs() < 1e-12);
        assert_eq!(out[2], 2.5);
        Ok(())
    }

    #[test]
    fn test_combined_function_is_shareable_across_threads() -> Result<(), Box<dyn std::error::Error>>
    {
        let exprs = vec![Expr::Sub(
            Box::new(Expr::var("x", 0)),
            Box::new(Expr::Const(1.0)),
        )];
        let func = build_combined_function(&exprs)?;

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let func = func.clone();
                std::thread::spawn(move || {
                    let mut out = [0.0];
                    func(&[i as f64], &mut out);
                    out[0]
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let value = handle.join().map_err(|_| "thread panicked")?;
            assert_eq!(value, i as f64 - 1.0);
        }
        Ok(())
    }
}
