//! Background tasks for network fetches.
//!
//! Native builds run tasks on a Tokio runtime, which reqwest requires. WASM
//! builds use Bevy's task pool, where reqwest goes through the browser's
//! fetch API.

use std::future::Future;
#[cfg(target_family = "wasm")]
use std::marker::PhantomData;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

/// Installs the async runtime for the current platform.
pub struct AsyncRuntimePlugin;

impl Plugin for AsyncRuntimePlugin {
    fn build(&self, app: &mut App) {
        #[cfg(target_family = "wasm")]
        let _ = app;

        #[cfg(not(target_family = "wasm"))]
        app.add_plugins(bevy_tokio_tasks::TokioTasksPlugin::default());
    }
}

/// Spawns fire-and-forget tasks; results come back over channels.
#[derive(SystemParam)]
pub struct TaskSpawner<'w, 's> {
    #[cfg(not(target_family = "wasm"))]
    runtime: Res<'w, bevy_tokio_tasks::TokioTasksRuntime>,
    #[cfg(target_family = "wasm")]
    _marker: PhantomData<&'w ()>,
    _local: Local<'s, ()>,
}

impl TaskSpawner<'_, '_> {
    #[cfg(not(target_family = "wasm"))]
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn_background_task(move |_ctx| future);
    }

    /// The browser is single-threaded, so the future need not be `Send`.
    #[cfg(target_family = "wasm")]
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        bevy::tasks::AsyncComputeTaskPool::get()
            .spawn_local(future)
            .detach();
    }
}
