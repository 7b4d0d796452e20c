use crate::{
    context::MapContext,
    schedule::Stage,
    tcs::system::{BoxedSystem, System},
};

/// A [`Stage`] made of systems which share the [`MapContext`] one after another.
#[derive(Default)]
pub struct SystemStage {
    systems: Vec<BoxedSystem>,
}

impl SystemStage {
    #[must_use]
    pub fn with_system(mut self, system: impl System) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Stage for SystemStage {
    fn run(&mut self, context: &mut MapContext) {
        for system in &mut self.systems {
            let name = system.name();
            #[cfg(feature = "trace")]
            let _span = tracing::info_span!("system", name = name.as_ref()).entered();
            log::trace!("running system {name}");
            system.run(context);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{borrow::Cow, cell::RefCell, rc::Rc, sync::Arc};

    use crate::{
        context::MapContext,
        coords::Zoom,
        fragment::emptiness::NeverEmpty,
        projection::GeographicProjection,
        schedule::Stage,
        settings::FragmentSettings,
        tcs::system::{stage::SystemStage, System},
        view_state::ViewState,
        world::World,
    };

    struct Recording {
        name: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl System for Recording {
        fn name(&self) -> Cow<'static, str> {
            self.name.into()
        }

        fn run(&mut self, _context: &mut MapContext) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn test_systems_run_in_insertion_order() {
        let settings = FragmentSettings::default();
        let mut context = MapContext {
            world: World::new(&settings).unwrap(),
            view_state: ViewState::new(Zoom::default()),
            settings,
            projection: Arc::new(GeographicProjection),
            emptiness: Box::new(NeverEmpty),
        };

        let log = Rc::new(RefCell::new(Vec::new()));
        let recording = |name| Recording {
            name,
            log: log.clone(),
        };
        let mut stage = SystemStage::default()
            .with_system(recording("diff"))
            .with_system(recording("download"));
        assert_eq!(stage.len(), 2);

        stage.run(&mut context);
        stage.run(&mut context);
        assert_eq!(*log.borrow(), vec!["diff", "download", "diff", "download"]);
    }
}
