//! Utilities for working with variable maps.
use anyhow::{anyhow, Result};
use candle_nn::VarMap;

/// Copies every variable of `src` into `dest`.
///
/// Variables are identified by their names; both maps must have been built
/// from the same network configuration. This is the snapshot-synchronization
/// primitive: the training loop calls it (through
/// [`ActorCritic::sync_snapshot`](crate::actor_critic::ActorCritic::sync_snapshot))
/// at the start of each trust-region iteration.
pub fn copy_params(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = dest.data().lock().unwrap();
    let src = src.data().lock().unwrap();

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("variable {} missing in source varmap", k_dest))?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Scales a named variable in place.
///
/// Used to divide the final policy-head weights by 100 after initialization,
/// which keeps the initial action distribution near-flat.
pub fn scale_weight(varmap: &VarMap, name: &str, factor: f64) -> Result<()> {
    let data = varmap.data().lock().unwrap();
    let var = data
        .get(name)
        .ok_or_else(|| anyhow!("variable {} not found in varmap", name))?;
    let scaled = (var.as_tensor() * factor)?;
    var.set(&scaled)?;
    Ok(())
}
