//! The badge-on-a-lanyard scene: chain, band and card dragging.
//!
//! Per frame, after the physics step: drag override, settling, band resample.

use bevy::{color::palettes::css::*, picking::{backend::HitData, pointer::PointerInteraction}, prelude::*, window::PrimaryWindow};

pub mod chain;
pub mod curve;
pub mod drag;

use chain::Chain;
use curve::BandSampler;
use drag::{DragController, apply_settling};

use crate::camera::{CameraState, frame_camera, frame_pointer};
use crate::config::{LanyardSettings, load_settings};
use crate::error::{LanyardError, LanyardResult};
use crate::physics::{BodyLink, sync_transforms};
use crate::physics::body::Rigidbody3DShape;
use crate::physics::rb_system::RigidbodySystem3D;

/// Input the frame update reads, gathered up front.
#[derive(Debug, Clone)]
pub struct FrameInput
{
  pub camera: LanyardResult<CameraState>,
  pub pointer: LanyardResult<Vec2>,
}

/// Owns everything the lanyard keeps between frames.
#[derive(Resource, Debug)]
pub struct Lanyard
{
  pub chain: Option<Chain>,
  pub band: BandSampler,
  pub drag: DragController,
}

impl Lanyard
{
  pub fn new(settings: &LanyardSettings) -> Self
  {
    Self
    {
      chain: None,
      band: BandSampler::new(settings.band_points, settings.curve_type),
      drag: DragController::default(),
    }
  }

  pub fn chain(&self) -> LanyardResult<Chain>
  {
    self.chain.ok_or(LanyardError::ChainNotBuilt)
  }

  /// Band polyline for this frame, card end first.
  pub fn polyline(&self) -> &[Vec3]
  {
    self.band.polyline()
  }

  /// Drag override, settling, band resample, in that order.
  ///
  /// A failing stage is logged and skipped; the others still run.
  pub fn frame_update(&mut self, system: &mut RigidbodySystem3D, input: &FrameInput, settings: &LanyardSettings)
  {
    let chain = match self.chain()
    {
      Ok(chain) => chain,
      Err(e) =>
      {
        debug!("lanyard frame skipped: {e}");
        return;
      }
    };

    if let Err(e) = self.drag.update(system, chain.card, input.camera.as_ref().map_err(|e| e.clone()), input.pointer.clone(), settings.unproject_depth)
    {
      debug!("drag update skipped: {e}");
    }
    if let Err(e) = apply_settling(system, chain.card, settings.settling_factor)
    {
      debug!("settling skipped: {e}");
    }
    if let Err(e) = self.band.sample_chain(system, &chain)
    {
      debug!("band resample skipped: {e}");
    }
  }
}

/// Marks the entity the pointer can grab.
#[derive(Component)]
pub struct Grabbable;

pub struct LanyardPlugin;
impl Plugin for LanyardPlugin
{
  fn build(&self, app: &mut App)
  {
    app
      .init_resource::<LanyardSettings>()
      .add_systems(PreStartup, (load_settings, apply_settings).chain())
      .add_systems(Startup, setup)
      .add_systems(Update, (handle_pointer, frame, sync_transforms, draw_band, draw_debug).chain());
  }
}

fn apply_settings(mut commands: Commands, settings: Res<LanyardSettings>, mut system: ResMut<RigidbodySystem3D>)
{
  system.gravity = settings.gravity;
  system.damping = settings.damping;
  system.integrator = settings.integrator;
  system.solver_iterations = settings.solver_iterations;
  system.substeps = settings.substeps;
  commands.insert_resource(Time::<Fixed>::from_hz(settings.fixed_hz));
  commands.insert_resource(Lanyard::new(&settings));
}

fn setup(mut commands: Commands,
         mut meshes: ResMut<Assets<Mesh>>,
         mut materials: ResMut<Assets<StandardMaterial>>,
         mut system: ResMut<RigidbodySystem3D>,
         mut lanyard: ResMut<Lanyard>,
         settings: Res<LanyardSettings>)
{
  let chain = Chain::build(&mut system, &settings);
  lanyard.chain = Some(chain);

  let link_material = materials.add(Color::srgb_u8(124, 144, 255));
  let card_material = materials.add(StandardMaterial {
    base_color: Color::WHITE,
    perceptual_roughness: 0.3,
    metallic: 0.5,
    clearcoat: 1.0,
    clearcoat_perceptual_roughness: 0.15,
    ..default()
  });

  for handle in [chain.anchor, chain.link1, chain.link2, chain.link3, chain.card]
  {
    let Some(rb) = system.body(handle) else { continue; };
    let mut entity = commands.spawn((
      Mesh3d(meshes.add(shape_mesh(rb.shape, settings.link_radius))),
      Transform::from_translation(rb.x).with_rotation(rb.q),
      BodyLink(handle),
    ));
    if handle == chain.card
    {
      entity.insert((MeshMaterial3d(card_material.clone()), Grabbable));
    }
    else
    {
      entity.insert(MeshMaterial3d(link_material.clone()));
    }
  }

  // light
  commands.spawn((
    PointLight {
      shadows_enabled: true,
      ..default()
    },
    Transform::from_xyz(4.0, 8.0, 4.0),
  ));

  info!("lanyard built: anchor {}, card {}", chain.anchor, chain.card);
}

// points have no extent of their own, they are drawn at `point_radius`
fn shape_mesh(shape: Rigidbody3DShape, point_radius: f32) -> Mesh
{
  match shape
  {
    Rigidbody3DShape::Point => Sphere::new(point_radius).into(),
    Rigidbody3DShape::Sphere { r } => Sphere::new(r).into(),
    Rigidbody3DShape::Cuboid { x, y, z } => Cuboid::new(x, y, z).into(),
  }
}

/// Nearest hit on a grabbable entity, looking past anything drawn in front.
///
/// Hits come sorted nearest first.
fn first_grabbable_hit<'a>(hits: impl IntoIterator<Item = &'a (Entity, HitData)>, is_grabbable: impl Fn(Entity) -> bool) -> Option<Vec3>
{
  hits.into_iter()
      .find(|(entity, _)| is_grabbable(*entity))
      .and_then(|(_, hit)| hit.position)
}

// pointer down on the card starts a drag, releasing the button anywhere ends it
fn handle_pointer(pointers: Query<&PointerInteraction>,
                  grabbables: Query<(), With<Grabbable>>,
                  mouse_buttons: Res<ButtonInput<MouseButton>>,
                  mut system: ResMut<RigidbodySystem3D>,
                  mut lanyard: ResMut<Lanyard>)
{
  let Ok(chain) = lanyard.chain() else { return; };

  if mouse_buttons.just_pressed(MouseButton::Left) && !lanyard.drag.is_dragging()
  {
    let hit = pointers.iter()
                      .find_map(|interaction| first_grabbable_hit(interaction.iter(), |entity| grabbables.contains(entity)));
    if let Some(point) = hit
    {
      if let Err(e) = lanyard.drag.pointer_down(&mut system, chain.card, point)
      {
        warn!("could not start drag: {e}");
      }
    }
  }

  if mouse_buttons.just_released(MouseButton::Left)
  {
    if let Err(e) = lanyard.drag.pointer_up(&mut system, chain.card)
    {
      warn!("could not end drag: {e}");
    }
  }
}

fn frame(cameras: Query<(&Camera, &GlobalTransform)>,
         windows: Query<&Window, With<PrimaryWindow>>,
         settings: Res<LanyardSettings>,
         mut system: ResMut<RigidbodySystem3D>,
         mut lanyard: ResMut<Lanyard>)
{
  let input = FrameInput
  {
    camera: frame_camera(&cameras),
    pointer: frame_pointer(&windows),
  };
  lanyard.band.set_curve_type(settings.curve_type);
  lanyard.frame_update(&mut system, &input, &settings);
}

fn draw_band(lanyard: Res<Lanyard>, mut gizmos: Gizmos)
{
  if lanyard.chain.is_none()
  {
    return;
  }
  gizmos.linestrip(lanyard.polyline().iter().copied(), WHITE);
}

fn draw_debug(settings: Res<LanyardSettings>,
              system: Res<RigidbodySystem3D>,
              lanyard: Res<Lanyard>,
              pointers: Query<&PointerInteraction>,
              grabbables: Query<(), With<Grabbable>>,
              mut gizmos: Gizmos)
{
  if !settings.debug_draw
  {
    return;
  }

  // joints
  for c in system.constraints()
  {
    if let Some((pos_a, pos_b)) = c.world_anchors(&system.bodies)
    {
      gizmos
        .arrow(pos_a, pos_b, ORANGE_RED)
        .with_double_end()
        .with_tip_length(0.1);
      gizmos.sphere(pos_b, 0.05, GREEN);
    }
  }

  // where the pointer would grab the card
  for point in pointers.iter()
                       .filter_map(|interaction| first_grabbable_hit(interaction.iter(), |entity| grabbables.contains(entity)))
  {
    gizmos.sphere(point, 0.05, YELLOW);
  }

  if let (Some(offset), Ok(chain)) = (lanyard.drag.grab_offset(), lanyard.chain())
  {
    if let Some(center) = system.translation(chain.card)
    {
      gizmos.arrow(center, center + offset, LIGHT_SALMON).with_tip_length(0.1);
    }
  }
}
