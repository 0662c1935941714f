//! Named point-wise kernels for common mass and diffusion operators.
//!
//! | Name             | Inputs                                     | Outputs                  |
//! |------------------|--------------------------------------------|--------------------------|
//! | `Mass1DBuild`    | `dx` (1, Grad), `weights` (1, Weight)      | `qdata` (1, None)        |
//! | `Mass2DBuild`    | `dx` (4, Grad), `weights` (1, Weight)      | `qdata` (1, None)        |
//! | `MassApply`      | `u` (1, Interp), `qdata` (1, None)         | `v` (1, Interp)          |
//! | `Poisson1DBuild` | `dx` (1, Grad), `weights` (1, Weight)      | `qdata` (1, None)        |
//! | `Poisson1DApply` | `du` (1, Grad), `qdata` (1, None)          | `dv` (1, Grad)           |
//! | `Identity`       | `input` (1, Interp)                        | `output` (1, Interp)     |
use crate::error::{Error, Result};
use crate::qfunction::{EvalMode, QFunction, QFunctionInputs, QFunctionOutputs};
use crate::Real;
use itertools::izip;

/// Names of all kernels available through [`by_name`].
pub const GALLERY_NAMES: [&str; 6] = [
    "Mass1DBuild",
    "Mass2DBuild",
    "MassApply",
    "Poisson1DBuild",
    "Poisson1DApply",
    "Identity",
];

/// Looks up a kernel by name.
pub fn by_name<T: Real>(name: &str) -> Result<QFunction<'static, T>> {
    let qf = match name {
        "Mass1DBuild" => mass_1d_build()?,
        "Mass2DBuild" => mass_2d_build()?,
        "MassApply" => mass_apply()?,
        "Poisson1DBuild" => poisson_1d_build()?,
        "Poisson1DApply" => poisson_1d_apply()?,
        "Identity" => identity()?,
        _ => return Err(Error::UnknownQFunction { name: name.to_string() }),
    };
    Ok(qf.named(name))
}

/// Quadrature data `w * |J|` for a mass matrix on a 1D mesh.
pub fn mass_1d_build<T: Real>() -> Result<QFunction<'static, T>> {
    let build = |[dx, weights, ..]: QFunctionInputs<T>, [qdata, ..]: QFunctionOutputs<T>| -> eyre::Result<()> {
        for (qdata, &dx, &w) in izip!(qdata.iter_mut(), dx.iter(), weights.iter()) {
            *qdata = w * dx;
        }
        Ok(())
    };
    QFunction::create(Box::new(build))
        .input("dx", 1, EvalMode::Grad)?
        .input("weights", 1, EvalMode::Weight)?
        .output("qdata", 1, EvalMode::None)
}

/// Quadrature data `w * det(J)` for a mass matrix on a 2D mesh.
///
/// `dx` holds the reference gradient of the two coordinate components, so that
/// `dx[(d * 2 + c) * q + i]` is the derivative of coordinate `c` along reference direction `d`.
pub fn mass_2d_build<T: Real>() -> Result<QFunction<'static, T>> {
    let build = |[dx, weights, ..]: QFunctionInputs<T>, [qdata, ..]: QFunctionOutputs<T>| -> eyre::Result<()> {
        let q = qdata.len();
        for (i, (qdata, &w)) in qdata.iter_mut().zip(weights).enumerate() {
            let j = |k: usize| dx[k * q + i];
            *qdata = w * (j(0) * j(3) - j(2) * j(1));
        }
        Ok(())
    };
    QFunction::create(Box::new(build))
        .input("dx", 4, EvalMode::Grad)?
        .input("weights", 1, EvalMode::Weight)?
        .output("qdata", 1, EvalMode::None)
}

/// Applies the mass matrix, `v = qdata * u`.
pub fn mass_apply<T: Real>() -> Result<QFunction<'static, T>> {
    let apply = |[u, qdata, ..]: QFunctionInputs<T>, [v, ..]: QFunctionOutputs<T>| -> eyre::Result<()> {
        for (v, &u, &qdata) in izip!(v.iter_mut(), u.iter(), qdata.iter()) {
            *v = qdata * u;
        }
        Ok(())
    };
    QFunction::create(Box::new(apply))
        .input("u", 1, EvalMode::Interp)?
        .input("qdata", 1, EvalMode::None)?
        .output("v", 1, EvalMode::Interp)
}

/// Quadrature data `w / |J|` for the 1D Laplacian.
///
/// Fails if an element has a vanishing Jacobian.
pub fn poisson_1d_build<T: Real>() -> Result<QFunction<'static, T>> {
    let build = |[dx, weights, ..]: QFunctionInputs<T>, [qdata, ..]: QFunctionOutputs<T>| -> eyre::Result<()> {
        for (qdata, &dx, &w) in izip!(qdata.iter_mut(), dx.iter(), weights.iter()) {
            if dx == T::zero() {
                eyre::bail!("degenerate element with zero Jacobian");
            }
            *qdata = w / dx;
        }
        Ok(())
    };
    QFunction::create(Box::new(build))
        .input("dx", 1, EvalMode::Grad)?
        .input("weights", 1, EvalMode::Weight)?
        .output("qdata", 1, EvalMode::None)
}

/// Applies the 1D Laplacian, `dv = qdata * du`.
pub fn poisson_1d_apply<T: Real>() -> Result<QFunction<'static, T>> {
    let apply = |[du, qdata, ..]: QFunctionInputs<T>, [dv, ..]: QFunctionOutputs<T>| -> eyre::Result<()> {
        for (dv, &du, &qdata) in izip!(dv.iter_mut(), du.iter(), qdata.iter()) {
            *dv = qdata * du;
        }
        Ok(())
    };
    QFunction::create(Box::new(apply))
        .input("du", 1, EvalMode::Grad)?
        .input("qdata", 1, EvalMode::None)?
        .output("dv", 1, EvalMode::Grad)
}

/// Copies its input to its output.
pub fn identity<T: Real>() -> Result<QFunction<'static, T>> {
    let copy = |[input, ..]: QFunctionInputs<T>, [output, ..]: QFunctionOutputs<T>| -> eyre::Result<()> {
        output.copy_from_slice(input);
        Ok(())
    };
    QFunction::create(Box::new(copy))
        .input("input", 1, EvalMode::Interp)?
        .output("output", 1, EvalMode::Interp)
}
