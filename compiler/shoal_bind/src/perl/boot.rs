//! Bootstrap code run when the Perl module loads.

use shoal_codegen::c_ast::{Item, Signature, Stmt, Storage};
use shoal_model::{CompilationSession, Parcel};

use crate::host::BindConfig;

/// `neato_Neato_bootstrap`
pub(crate) fn boot_func(parcel: &Parcel, config: &BindConfig) -> String {
    format!("{}{}_bootstrap", parcel.prefix().lower(), config.boot_ident())
}

pub(crate) fn boot_guard(config: &BindConfig) -> String {
    format!("{}_BOOT", config.boot_ident().to_ascii_uppercase())
}

pub(crate) fn boot_h(parcel: &Parcel, config: &BindConfig) -> Item {
    Item::Guard {
        symbol: boot_guard(config),
        items: vec![Item::Prototype(Signature::new(
            Storage::Plain,
            "void",
            boot_func(parcel, config),
            "void",
        ))],
    }
}

/// Bootstraps every generated parcel, then mirrors the class hierarchy in
/// `@ISA`.
pub(crate) fn boot_c(
    session: &CompilationSession,
    parcel: &Parcel,
    config: &BindConfig,
) -> Vec<Item> {
    let mut items = vec![Item::include("ShoalXS.h"), Item::include("boot.h")];
    let generated: Vec<&Parcel> = session
        .parcels()
        .map(|(_, p)| p)
        .filter(|p| !p.is_included())
        .collect();
    for p in &generated {
        items.push(Item::include(format!("{}parcel.h", p.prefix().lower())));
    }
    items.push(Item::Blank);

    let mut body = vec![Stmt::Line("dTHX;".to_string())];
    let subclasses: Vec<_> = session
        .ordered_classes()
        .filter(|c| !c.is_included() && !c.is_inert())
        .filter_map(|c| Some((c, session.parent(c.id())?)))
        .collect();
    if !subclasses.is_empty() {
        body.push(Stmt::Decl {
            ty: "AV".to_string(),
            name: "*isa".to_string(),
            init: None,
        });
    }
    for p in &generated {
        body.push(Stmt::expr(format!("{}bootstrap_parcel()", p.prefix().lower())));
    }
    for (class, parent) in subclasses {
        body.push(Stmt::expr(format!("isa = get_av(\"{}::ISA\", 1)", class.name())));
        body.push(Stmt::expr(format!(
            "av_push(isa, newSVpv(\"{}\", 0))",
            parent.name()
        )));
    }

    items.push(Item::Function {
        sig: Signature::new(Storage::Plain, "void", boot_func(parcel, config), "void"),
        body,
    });
    items
}
