use std::sync::Arc;

use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};
use tracing::{debug, trace};

use crate::{
    cache::GeometryCache,
    config::Configuration,
    error::Result,
    evaluator::Evaluator,
    expr::ExprEvaluator,
    mesh::{Geometry, Topology},
    pipeline::{build_geometry, trial_evaluate},
    request::{ComputeState, RequestToken, RequestTracker},
    state::try_commit,
    types::Mode,
};

/// System sets for the plotting pipeline.
///
/// ```text
/// FunctionPlotSet::Spawn  →  [async compute]  →  FunctionPlotSet::Generate  →  FunctionPlotSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionPlotSet {
    /// Queues changed plots and spawns an async compute task for each.
    Spawn,
    /// Polls async tasks and inserts [`PlotGeometry`] for the latest request.
    Generate,
    /// Uploads changed [`PlotGeometry`] into a Bevy [`Mesh3d`].
    Upload,
}

/// A function plot entity: the committed [`Configuration`].
///
/// Changing it queues a recompute; until that finishes the previous
/// [`PlotGeometry`] and mesh stay in place.
///
/// ```rust,ignore
/// fn on_submit(mut plots: Query<&mut FunctionPlot>, evaluator: Res<PlotEvaluator>) {
///     for mut plot in &mut plots {
///         if let Err(err) = plot.commit_expression("sin(x) * y", evaluator.get()) {
///             // show `err`; the plot keeps its previous expression
///         }
///     }
/// }
/// ```
#[derive(Component, Clone, Debug)]
#[require(Transform, PlotRequests)]
pub struct FunctionPlot {
    config: Configuration,
}

impl Default for FunctionPlot {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl FunctionPlot {
    /// Wraps `config` without checking its expression. An expression the
    /// evaluator rejects plots as all zeros.
    pub fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// Like [`new`](FunctionPlot::new), but runs the trial evaluation first.
    pub fn try_new(config: Configuration, evaluator: &dyn Evaluator) -> Result<Self> {
        trial_evaluate(&config.expression, evaluator)?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Replaces the expression if it passes the trial evaluation; on error
    /// nothing changes.
    pub fn commit_expression(&mut self, expression: &str, evaluator: &dyn Evaluator) -> Result<()> {
        self.config = try_commit(&self.config, expression, evaluator)?;
        Ok(())
    }

    pub fn set_resolution(&mut self, resolution: usize) {
        self.config = self.config.with_resolution(resolution);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.config = self.config.with_mode(mode);
    }
}

/// Tracks the recompute requests issued for a [`FunctionPlot`].
#[derive(Component, Debug, Default)]
pub struct PlotRequests {
    tracker: RequestTracker,
    requested: Option<Configuration>,
}

impl PlotRequests {
    pub fn state(&self) -> ComputeState {
        self.tracker.state()
    }

    /// The configuration of the most recent request, if any.
    pub fn requested(&self) -> Option<&Configuration> {
        self.requested.as_ref()
    }

    fn issue(&mut self, config: &Configuration) -> RequestToken {
        self.requested = Some(config.clone());
        self.tracker.issue()
    }
}

/// Marker component added to [`FunctionPlot`] entities that need a recompute.
///
/// Inserted automatically when the `auto_queue` feature is enabled; insert it
/// yourself otherwise.
#[derive(Component)]
pub struct QueuedPlot;

/// The in-flight async compute task for a [`FunctionPlot`].
///
/// Replacing it drops, and so cancels, the older task.
#[derive(Component)]
pub struct PlotTask {
    token: RequestToken,
    config: Configuration,
    task: Task<Geometry>,
}

/// The last geometry computed for the plot's latest request.
#[derive(Component, Clone, Debug)]
pub struct PlotGeometry(pub Arc<Geometry>);

/// The evaluator used for every plot. Defaults to [`ExprEvaluator`].
///
/// Insert your own before adding [`FunctionPlotPlugin`] to swap the engine.
/// Replacing it later clears [`PlotCache`] and recomputes every plot.
#[derive(Resource, Clone)]
pub struct PlotEvaluator(pub Arc<dyn Evaluator>);

impl Default for PlotEvaluator {
    fn default() -> Self {
        Self(Arc::new(ExprEvaluator))
    }
}

impl PlotEvaluator {
    pub fn get(&self) -> &dyn Evaluator {
        self.0.as_ref()
    }
}

/// Runtime configuration for the plotting pipeline.
///
/// Inserted as a resource by [`FunctionPlotPlugin`]. Modify it at any time:
///
/// ```rust,ignore
/// fn my_system(mut config: ResMut<FunctionPlotConfig>) {
///     config.cache_capacity = 0; // stop memoizing
/// }
/// ```
#[derive(Resource, Clone, Debug)]
pub struct FunctionPlotConfig {
    /// Maximum number of async recomputes spawned per frame. Default: `4`.
    pub max_tasks_per_frame: usize,
    /// Number of finished geometries kept for reuse, keyed by configuration.
    /// `0` disables the cache. Default: `16`.
    pub cache_capacity: usize,
}

impl Default for FunctionPlotConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
            cache_capacity: 16,
        }
    }
}

/// Geometry memo shared by every plot.
#[derive(Resource)]
pub struct PlotCache(pub GeometryCache);

/// Bevy plugin that keeps a mesh in sync with each [`FunctionPlot`].
///
/// Recomputes run on Bevy's `AsyncComputeTaskPool` so the main thread is
/// never blocked:
///
/// ```text
/// FunctionPlot added or changed
///   → QueuedPlot inserted             (queue_changed_plots, `auto_queue` feature)
///   → PlotTask spawned                (FunctionPlotSet::Spawn, or PlotGeometry on a cache hit)
///   → [async compute runs]
///   → PlotGeometry inserted           (FunctionPlotSet::Generate, latest request only)
///   → Mesh3d inserted                 (FunctionPlotSet::Upload)
/// ```
///
/// Give the entity a material that uses vertex colors, e.g. a
/// `StandardMaterial` (unlit for curves).
pub struct FunctionPlotPlugin {
    /// Initial value for [`FunctionPlotConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
    /// Initial value for [`FunctionPlotConfig::cache_capacity`].
    pub cache_capacity: usize,
}

impl Default for FunctionPlotPlugin {
    fn default() -> Self {
        let config = FunctionPlotConfig::default();
        Self {
            max_tasks_per_frame: config.max_tasks_per_frame,
            cache_capacity: config.cache_capacity,
        }
    }
}

impl Plugin for FunctionPlotPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(FunctionPlotConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
            cache_capacity: self.cache_capacity,
        })
        .insert_resource(PlotCache(GeometryCache::new(self.cache_capacity)))
        .init_resource::<PlotEvaluator>();

        app.configure_sets(
            Update,
            (
                FunctionPlotSet::Spawn,
                FunctionPlotSet::Generate,
                FunctionPlotSet::Upload,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                sync_cache_capacity.before(FunctionPlotSet::Spawn),
                refresh_on_evaluator_change.before(FunctionPlotSet::Spawn),
                spawn_plot_tasks.in_set(FunctionPlotSet::Spawn),
                poll_plot_tasks.in_set(FunctionPlotSet::Generate),
                upload_plot_mesh.in_set(FunctionPlotSet::Upload),
            ),
        );

        #[cfg(feature = "auto_queue")]
        app.add_systems(
            Update,
            queue_changed_plots.before(spawn_plot_tasks),
        );
    }
}

/// Inserts [`QueuedPlot`] on every added or changed [`FunctionPlot`] whose
/// configuration differs from the last one requested.
#[cfg(feature = "auto_queue")]
fn queue_changed_plots(
    mut commands: Commands,
    query: Query<(Entity, &FunctionPlot, &PlotRequests), Changed<FunctionPlot>>,
) {
    for (entity, plot, requests) in query.iter() {
        if requests.requested() != Some(plot.config()) {
            commands.entity(entity).insert(QueuedPlot);
        }
    }
}

fn sync_cache_capacity(config: Res<FunctionPlotConfig>, mut cache: ResMut<PlotCache>) {
    if config.is_changed() {
        cache.0.resize(config.cache_capacity);
    }
}

/// Cached geometry came from the previous engine, so a new [`PlotEvaluator`]
/// drops it and requeues every plot.
fn refresh_on_evaluator_change(
    mut commands: Commands,
    evaluator: Res<PlotEvaluator>,
    mut cache: ResMut<PlotCache>,
    plots: Query<Entity, With<FunctionPlot>>,
) {
    if !evaluator.is_changed() || evaluator.is_added() {
        return;
    }
    debug!(cached = cache.0.len(), "evaluator replaced, clearing plot cache");
    cache.0.clear();
    for entity in &plots {
        commands.entity(entity).insert(QueuedPlot);
    }
}

/// Serves [`QueuedPlot`]s from the cache or spawns async tasks for them, up to
/// [`FunctionPlotConfig::max_tasks_per_frame`] per frame.
///
/// A plot that already has a task in flight gets a new one; the old
/// [`PlotTask`] is replaced and its result will never be committed.
fn spawn_plot_tasks(
    mut commands: Commands,
    config: Res<FunctionPlotConfig>,
    evaluator: Res<PlotEvaluator>,
    mut cache: ResMut<PlotCache>,
    mut query: Query<(Entity, &FunctionPlot, &mut PlotRequests), With<QueuedPlot>>,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, plot, mut requests) in query.iter_mut().take(config.max_tasks_per_frame) {
        let plot_config = plot.config().clone();
        let token = requests.issue(&plot_config);

        if let Some(geometry) = cache.0.get(&plot_config) {
            trace!(?plot_config, "plot geometry served from cache");
            requests.tracker.complete(token);
            commands
                .entity(entity)
                .insert(PlotGeometry(geometry))
                .remove::<(QueuedPlot, PlotTask)>();
            continue;
        }

        let evaluator = Arc::clone(&evaluator.0);
        let task_config = plot_config.clone();
        let task = task_pool.spawn(async move { build_geometry(&task_config, evaluator.as_ref()) });

        debug!(?token, config = ?plot_config, "spawned plot task");
        commands
            .entity(entity)
            .insert(PlotTask {
                token,
                config: plot_config,
                task,
            })
            .remove::<QueuedPlot>();
    }
}

/// Polls in-flight [`PlotTask`]s each frame and commits finished results.
///
/// Non-blocking: tasks that haven't finished are skipped and retried next frame.
/// A result whose token was superseded is dropped.
fn poll_plot_tasks(
    mut commands: Commands,
    mut cache: ResMut<PlotCache>,
    mut query: Query<(Entity, &mut PlotTask, &mut PlotRequests)>,
) {
    for (entity, mut plot_task, mut requests) in query.iter_mut() {
        let Some(geometry) = block_on(future::poll_once(&mut plot_task.task)) else {
            continue;
        };

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<PlotTask>();
        if !requests.tracker.complete(plot_task.token) {
            debug!(token = ?plot_task.token, "discarding superseded plot geometry");
            continue;
        }

        let geometry = Arc::new(geometry);
        cache.0.put(plot_task.config.clone(), Arc::clone(&geometry));
        entity_commands.insert(PlotGeometry(geometry));
    }
}

/// Uploads every changed [`PlotGeometry`] into a fresh [`Mesh3d`].
///
/// The previous mesh handle is replaced, so the old mesh stays visible right
/// up to the frame the new one arrives.
fn upload_plot_mesh(
    mut commands: Commands,
    query: Query<(Entity, &PlotGeometry), Changed<PlotGeometry>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, geometry) in query.iter() {
        let mesh = geometry_to_mesh(&geometry.0);
        commands.entity(entity).insert(Mesh3d(meshes.add(mesh)));
    }
}

/// Converts a [`Geometry`] into a Bevy [`Mesh`].
///
/// Curves become a `LineStrip` with positions and colors. Surfaces become an
/// indexed `TriangleList` with positions, normals and colors.
pub fn geometry_to_mesh(geometry: &Geometry) -> Mesh {
    let topology = match geometry.topology {
        Topology::LineStrip => PrimitiveTopology::LineStrip,
        Topology::Grid { .. } => PrimitiveTopology::TriangleList,
    };
    let mut mesh = Mesh::new(topology, RenderAssetUsages::RENDER_WORLD);

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, geometry.positions());
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, geometry.colors_rgba());
    if let Some(normals) = geometry.normals() {
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals.to_vec());
    }
    if let Some(indices) = geometry.indices() {
        mesh.insert_indices(Indices::U32(indices));
    }
    mesh
}
