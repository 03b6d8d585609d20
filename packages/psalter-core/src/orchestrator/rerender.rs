use std::cell::{Ref, RefCell, RefMut};
use std::future::Future;
use std::rc::Rc;

use log::{debug, warn};
use tokio::task::JoinHandle;

use super::Session;
use crate::address::Address;
use crate::engine::{LocalBoxFuture, RenderEngine, RenderOptions};
use crate::error::PsalterError;
use crate::playlist::notation_target;
use crate::view_state::ViewState;
use crate::voices::filter_voices;

/// Shared handle to a session and its engine.
///
/// Cloning is cheap and every clone drives the same page.
pub struct Orchestrator<E: RenderEngine, A> {
    engine: Rc<E>,
    session: Rc<RefCell<Session<E::Control, A>>>,
}

impl<E: RenderEngine, A> Clone for Orchestrator<E, A> {
    fn clone(&self) -> Self {
        Orchestrator {
            engine: Rc::clone(&self.engine),
            session: Rc::clone(&self.session),
        }
    }
}

impl<E, A> Orchestrator<E, A>
where
    E: RenderEngine + 'static,
    A: Address + 'static,
{
    pub fn new(engine: E, session: Session<E::Control, A>) -> Self {
        Orchestrator {
            engine: Rc::new(engine),
            session: Rc::new(RefCell::new(session)),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn session(&self) -> Ref<'_, Session<E::Control, A>> {
        self.session.borrow()
    }

    pub(crate) fn session_mut(&self) -> RefMut<'_, Session<E::Control, A>> {
        self.session.borrow_mut()
    }

    pub(crate) fn shared_session(&self) -> Rc<RefCell<Session<E::Control, A>>> {
        Rc::clone(&self.session)
    }

    /// Re-filter and re-render every cached psalm, then rebuild its playback control.
    ///
    /// The visual renders run before this returns, in playlist order. The
    /// returned future resolves once every playback build has settled; the
    /// builds themselves are spawned tasks and keep running if it is dropped.
    /// A build that finishes after a newer render of the same entry is discarded.
    pub fn rerender_all(&self) -> impl Future<Output = ()> + 'static {
        let builds: Vec<JoinHandle<()>> = {
            let mut session = self.session.borrow_mut();
            let view = session.view_state();
            let display_width = session.display_width;
            let indices: Vec<usize> = session.cache.cached().map(|(index, _)| index).collect();

            let mut builds = Vec::with_capacity(indices.len());
            for index in indices {
                let generation = session.cache.begin_render(index);
                let control = match session.cache.notation(index) {
                    Some(notation) => {
                        render_entry(&*self.engine, index, notation, &view, display_width)
                    }
                    None => None,
                };
                if let Some(control) = control {
                    builds.push(self.install_control(index, generation, control));
                }
            }
            builds
        };
        debug!("re-rendered {} psalms", builds.len());

        async move {
            for build in builds {
                // a panicked build leaves the previous control in place
                let _ = build.await;
            }
        }
    }

    /// Spawn a playback build that installs its control for entry `index` when
    /// done, unless a later render of the entry has superseded `generation`.
    pub(crate) fn install_control(
        &self,
        index: usize,
        generation: u64,
        control: LocalBoxFuture<Result<E::Control, PsalterError>>,
    ) -> JoinHandle<()> {
        let session = Rc::clone(&self.session);
        tokio::task::spawn_local(async move {
            match control.await {
                Ok(control) => {
                    if session
                        .borrow_mut()
                        .cache
                        .install_control(index, generation, control)
                    {
                        debug!("installed playback control for entry {}", index);
                    }
                }
                Err(e) => warn!("playback for entry {} failed: {}", index, e),
            }
        })
    }
}

/// Filter one psalm's notation, render it, and start building its playback control.
///
/// Returns `None` if the engine rejects the render.
pub(crate) fn render_entry<E: RenderEngine>(
    engine: &E,
    index: usize,
    notation: &str,
    view: &ViewState,
    display_width: u32,
) -> Option<LocalBoxFuture<Result<E::Control, PsalterError>>> {
    let target = notation_target(index);
    let filtered = filter_voices(notation, &view.voices);
    let options = RenderOptions {
        display_width,
        transpose: view.transpose,
    };

    match engine.render(&target, &filtered, &options) {
        Ok(handle) => Some(engine.build_playback(handle, &target, view.transpose)),
        Err(e) => {
            warn!("render of {} failed: {}", target, e);
            None
        }
    }
}
