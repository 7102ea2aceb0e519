//! Installed-state prober: maps a catalog target onto its resource.
use anyhow::{Result, anyhow};

use super::context::Context;
use crate::config::catalog::{Action, Target};
use crate::resources::clone::CloneResource;
use crate::resources::fs::resolve_under;
use crate::resources::package::PackageResource;
use crate::resources::symlink::SymlinkResource;
use crate::resources::template::TemplateResource;
use crate::resources::{Resource, ResourceState};

/// Build the check+apply resource for `target`.
///
/// # Errors
///
/// Returns an error if the target's backend has no adapter on this platform.
pub fn resource_for<'a>(target: &Target, ctx: &'a Context) -> Result<Box<dyn Resource + 'a>> {
    let home = &ctx.platform.home;
    Ok(match &target.action {
        Action::Package(name) => {
            let backend = ctx.backends.get(target.backend).ok_or_else(|| {
                anyhow!(
                    "no {} adapter available on {}",
                    target.backend,
                    ctx.platform.os
                )
            })?;
            Box::new(PackageResource::new(name.clone(), backend))
        }
        Action::Link { source, target } => Box::new(SymlinkResource::new(
            resolve_under(&ctx.platform.dotfiles_dir(), source),
            resolve_under(home, target),
        )),
        Action::Clone { url, dest } => Box::new(CloneResource::new(
            url.clone(),
            resolve_under(home, dest),
            std::sync::Arc::clone(&ctx.interrupt),
        )),
        Action::Template { source, target } => Box::new(TemplateResource::new(
            resolve_under(&ctx.platform.root, source),
            resolve_under(home, target),
            ctx.identity.clone(),
            ctx.platform.os,
        )),
    })
}

/// Whether `target` is already converged. Read-only; never fails.
///
/// A missing adapter or an error while inspecting state counts as
/// unsatisfied and is logged at debug level.
#[must_use]
pub fn is_satisfied(target: &Target, ctx: &Context) -> bool {
    let state = resource_for(target, ctx).and_then(|r| r.current_state());
    match state {
        Ok(ResourceState::Correct) => true,
        Ok(_) => false,
        Err(e) => {
            ctx.log
                .debug(&format!("probe {} indeterminate: {e:#}", target.id));
            false
        }
    }
}
