//! Drives the class and parcel binders over a built session.

use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use shoal_model::{Class, CompilationSession};
use tracing::debug;

use crate::artifact::{ArtifactSet, Boilerplate, CommentStyle};
use crate::bind_class::ClassBinding;
use crate::bind_parcel::ParcelBinding;
use crate::c_ast::{render, Item};
use crate::layout::DispatchLayout;

/// Settings shared by every generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenConfig {
    pub boilerplate: Boilerplate,
    pub layout: DispatchLayout,
}

/// Generates the C headers and sources for every non-included parcel.
pub struct CoreGenerator<'a> {
    session: &'a CompilationSession,
    config: &'a GenConfig,
}

impl<'a> CoreGenerator<'a> {
    pub fn new(session: &'a CompilationSession, config: &'a GenConfig) -> Self {
        CoreGenerator { session, config }
    }

    /// Produce every core artifact.
    ///
    /// # Errors
    ///
    /// `E2010` if the session has not been built, `E3001`/`E3002` if a
    /// class's layout disagrees with its parent's, `E3003` on a path clash.
    #[tracing::instrument(level = "debug", skip_all, fields(classes = self.session.num_classes()))]
    pub fn generate(&self) -> DiagResult<ArtifactSet> {
        if !self.session.is_built() {
            return Err(Diagnostic::error(ErrorCode::E2010)
                .with_message("Cannot generate code before the hierarchy is built"));
        }

        let mut artifacts = ArtifactSet::new();
        for (id, parcel) in self.session.parcels() {
            if parcel.is_included() {
                continue;
            }
            let binding = ParcelBinding::new(self.session, id, self.config.layout);
            for class in binding.classes() {
                let class_binding = ClassBinding::new(self.session, class, self.config.layout);
                class_binding.check_consistency()?;
                let header = self.class_header(&binding, &class_binding, class);
                artifacts.insert(format!("include/{}", class.include_h()), header)?;
            }

            artifacts.insert(
                format!("include/{}", binding.parcel_h_name()),
                self.wrap(&[binding.to_parcel_h()]),
            )?;
            artifacts.insert(
                format!("source/{}", binding.parcel_c_name()),
                self.wrap(&binding.to_parcel_c()),
            )?;
            artifacts.insert(
                format!("include/{}", binding.callbacks_h_name()),
                self.wrap(&[binding.to_callbacks_h()]),
            )?;
            debug!(parcel = parcel.name(), "parcel artifacts generated");
        }
        Ok(artifacts)
    }

    fn class_header(
        &self,
        parcel: &ParcelBinding<'_>,
        binding: &ClassBinding<'_>,
        class: &Class,
    ) -> String {
        let mut body = vec![Item::include(parcel.parcel_h_name()), Item::Blank];
        body.extend(binding.to_c_header());
        let guarded = Item::Guard {
            symbol: binding.include_guard(),
            items: vec![Item::ExternC(body)],
        };
        debug!(class = class.name(), "class header generated");
        self.wrap(&[guarded])
    }

    fn wrap(&self, items: &[Item]) -> String {
        self.config
            .boilerplate
            .wrap(&render(items), CommentStyle::C)
    }
}
