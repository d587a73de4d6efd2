//! Perl XS bindings.
//!
//! Output, relative to the destination directory:
//!
//! - `perl/<Boot>.xs`: one XSUB per bound method or constructor, plus
//!   `_init_autobindings`, which registers them with `newXS`
//! - `perl/callbacks.c`: `_OVERRIDE` functions calling back into Perl
//! - `perl/boot.h`, `perl/boot.c`: parcel bootstrap and `@ISA` setup
//! - `perl/typemap`: conversions for xsubpp
//!
//! The C helpers prefixed `ShoalXS_` live in the hand-written runtime
//! header `ShoalXS.h`.

mod boot;
mod callbacks;
mod typemap;
mod xs;

pub use typemap::PerlTypeMap;

use shoal_codegen::c_ast::{render, Item};
use shoal_codegen::{ArtifactSet, Boilerplate, CommentStyle};
use shoal_diagnostic::DiagResult;
use shoal_model::CompilationSession;
use tracing::debug;

use crate::host::{insert_c, prepare, BindConfig, HostLanguage};
use crate::plan::{
    bound_methods, callback_methods, plan_callback, plan_constructor, plan_method, Binding,
};

/// Perl reserves `DESTROY` for destructors.
pub fn perl_rename(name: &str) -> Option<&'static str> {
    match name {
        "destroy" => Some("DESTROY"),
        _ => None,
    }
}

/// The Perl host.
#[derive(Copy, Clone, Debug, Default)]
pub struct PerlHost;

impl HostLanguage for PerlHost {
    fn name(&self) -> &'static str {
        "perl"
    }

    #[tracing::instrument(level = "debug", skip_all, fields(boot = %config.boot_class))]
    fn generate(
        &self,
        session: &CompilationSession,
        config: &BindConfig,
    ) -> DiagResult<ArtifactSet> {
        let mut artifacts = ArtifactSet::new();
        let Some(parcel) = prepare(session, config)? else {
            return Ok(artifacts);
        };
        let map = PerlTypeMap::new(session);

        let mut includes = vec![Item::include("ShoalXS.h"), Item::include("boot.h")];
        let mut xsubs = Vec::new();
        let mut registrations = Vec::new();
        let mut callback_items = callbacks::helpers();
        let mut stubs = 0usize;

        for class in session
            .ordered_classes()
            .filter(|c| !c.is_included() && !c.is_inert())
        {
            includes.push(Item::include(class.include_h()));

            let mut bindings = Vec::new();
            if let Some(ctor) = plan_constructor(class, &map)? {
                bindings.push(ctor);
            }
            bindings.extend(
                bound_methods(session, class).map(|m| plan_method(m, class, &map, perl_rename)),
            );
            for binding in &bindings {
                let (class_name, host_name) = match binding {
                    Binding::Ready(plan) => (&plan.class_name, &plan.host_name),
                    Binding::Stub(stub) => (&stub.class_name, &stub.host_name),
                };
                stubs += usize::from(binding.is_stub());
                registrations.push((
                    format!("{class_name}::{host_name}"),
                    xs::xsub_name(class_name, host_name),
                ));
                xsubs.push(Item::Blank);
                xsubs.extend(xs::xsub(binding));
            }

            for method in callback_methods(session, class) {
                let binding = plan_callback(method, &map, perl_rename);
                stubs += usize::from(binding.is_stub());
                callback_items.push(Item::Blank);
                callback_items.push(callbacks::callback(&binding));
            }
        }
        debug!(xsubs = registrations.len(), stubs, "perl bindings planned");

        let boot_ident = config.boot_ident();
        let mut xs_items = includes.clone();
        xs_items.extend(xsubs);
        let xs_text = format!(
            "{}\n{}",
            render(&xs_items),
            xs::module_section(&config.boot_class, &registrations)
        );
        // Comments are C only above the MODULE line.
        let header_only = Boilerplate::new(config.boilerplate.header.as_str(), "");
        artifacts.insert(
            format!("perl/{boot_ident}.xs"),
            header_only.wrap(&xs_text, CommentStyle::C),
        )?;

        let mut callback_file = includes;
        callback_file.extend(
            session
                .parcels()
                .filter(|(_, p)| !p.is_included())
                .map(|(_, p)| Item::include(format!("{}callbacks.h", p.prefix().lower()))),
        );
        callback_file.push(Item::Blank);
        callback_file.extend(callback_items);
        insert_c(&mut artifacts, config, "perl/callbacks.c", &callback_file)?;
        insert_c(
            &mut artifacts,
            config,
            "perl/boot.h",
            &[boot::boot_h(parcel, config)],
        )?;
        insert_c(
            &mut artifacts,
            config,
            "perl/boot.c",
            &boot::boot_c(session, parcel, config),
        )?;
        artifacts.insert(
            "perl/typemap",
            config
                .boilerplate
                .wrap(&map.to_typemap_file(session), CommentStyle::Hash),
        )?;
        Ok(artifacts)
    }
}
